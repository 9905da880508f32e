use crate::{http::StatusCode, Endpoint, IntoResponse, Request, Response};

/// Responds `404 Not Found` with the reason phrase as body.
pub(crate) struct NotFound;

#[async_trait::async_trait]
impl Endpoint for NotFound {
    async fn call(&self, _req: Request) -> Response {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

/// Responds an empty `405 Method Not Allowed`.
pub(crate) struct MethodNotAllowed;

#[async_trait::async_trait]
impl Endpoint for MethodNotAllowed {
    async fn call(&self, _req: Request) -> Response {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

/// Responds an empty `200 OK`, the `Allow` header is added by the mux.
pub(crate) struct AutomaticOptions;

#[async_trait::async_trait]
impl Endpoint for AutomaticOptions {
    async fn call(&self, _req: Request) -> Response {
        StatusCode::OK.into_response()
    }
}
