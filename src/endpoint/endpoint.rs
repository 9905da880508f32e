use std::{future::Future, marker::PhantomData, sync::Arc};

use crate::{IntoResponse, Middleware, Request, Response};

/// An HTTP request handler.
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync {
    /// Get the response to the request.
    async fn call(&self, req: Request) -> Response;
}

/// A boxed [`Endpoint`], the type stored in every route.
pub type BoxEndpoint = Box<dyn Endpoint>;

#[async_trait::async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Box<T> {
    async fn call(&self, req: Request) -> Response {
        self.as_ref().call(req).await
    }
}

#[async_trait::async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
    async fn call(&self, req: Request) -> Response {
        self.as_ref().call(req).await
    }
}

struct SyncFnEndpoint<T, F> {
    _mark: PhantomData<fn() -> T>,
    f: F,
}

#[async_trait::async_trait]
impl<F, T> Endpoint for SyncFnEndpoint<T, F>
where
    F: Fn(Request) -> T + Send + Sync,
    T: IntoResponse,
{
    async fn call(&self, req: Request) -> Response {
        (self.f)(req).into_response()
    }
}

struct AsyncFnEndpoint<T, F> {
    _mark: PhantomData<fn() -> T>,
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut, T> Endpoint for AsyncFnEndpoint<T, F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
    T: IntoResponse,
{
    async fn call(&self, req: Request) -> Response {
        (self.f)(req).await.into_response()
    }
}

/// Create an endpoint with a function.
///
/// # Example
///
/// ```
/// use feather::{endpoint::make_sync, Request};
///
/// let ep = make_sync(|req: Request| req.method().to_string());
/// ```
pub fn make_sync<F, T>(f: F) -> impl Endpoint
where
    F: Fn(Request) -> T + Send + Sync,
    T: IntoResponse,
{
    SyncFnEndpoint {
        _mark: PhantomData,
        f,
    }
}

/// Create an endpoint with a asyncness function.
///
/// # Example
///
/// ```
/// use feather::{endpoint::make, Request};
///
/// let ep = make(|req: Request| async move { req.param("id").to_string() });
/// ```
pub fn make<F, Fut, T>(f: F) -> impl Endpoint
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
    T: IntoResponse,
{
    AsyncFnEndpoint {
        _mark: PhantomData,
        f,
    }
}

/// Extension trait for [`Endpoint`].
pub trait EndpointExt: Endpoint {
    /// Wrap the endpoint in a Box.
    fn boxed(self) -> BoxEndpoint
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }

    /// Use middleware to transform this endpoint.
    ///
    /// This is how the not found, method not allowed and automatic `OPTIONS`
    /// handlers of a [`Mux`](crate::Mux) get wrapped.
    ///
    /// # Example
    ///
    /// ```
    /// use feather::{
    ///     endpoint::make_sync, http::StatusCode, middleware::SetHeader, EndpointExt, Mux,
    /// };
    ///
    /// let app = Mux::new().not_found(
    ///     make_sync(|_| (StatusCode::NOT_FOUND, "gone"))
    ///         .with(SetHeader::new().overriding("x-router", "feather")),
    /// );
    /// ```
    fn with<T>(self, middleware: T) -> T::Output
    where
        T: Middleware<Self>,
        Self: Sized,
    {
        middleware.transform(self)
    }
}

impl<T: Endpoint> EndpointExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_make() {
        let ep = make(|req: Request| async move { req.method().to_string() });
        let resp = ep
            .call(Request::builder().method(Method::DELETE).finish())
            .await;
        assert_eq!(resp.into_body().into_string().await.unwrap(), "DELETE");
    }

    #[tokio::test]
    async fn test_make_sync_boxed() {
        let ep = make_sync(|_| StatusCode::ACCEPTED).boxed();
        assert_eq!(
            ep.call(Request::default()).await.status(),
            StatusCode::ACCEPTED
        );

        let ep = Arc::new(ep);
        assert_eq!(
            ep.call(Request::default()).await.status(),
            StatusCode::ACCEPTED
        );
    }
}
