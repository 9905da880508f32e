use crate::{
    http::{header::HeaderName, HeaderMap, HeaderValue},
    Endpoint, Middleware, Request, Response,
};

/// Middleware for override/append headers to response.
///
/// Overrides are applied before appends.
#[derive(Default, Clone)]
pub struct SetHeader {
    overrides: HeaderMap,
    appends: HeaderMap,
}

impl SetHeader {
    /// Create new [`SetHeader`] middleware.
    #[must_use]
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts a header to response, replacing any previous value.
    ///
    /// Invalid names or values are ignored.
    #[must_use]
    pub fn overriding<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (key.try_into(), value.try_into()) {
            self.overrides.insert(key, value);
        }
        self
    }

    /// Appends a header to response.
    ///
    /// Invalid names or values are ignored.
    #[must_use]
    pub fn appending<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (key.try_into(), value.try_into()) {
            self.appends.append(key, value);
        }
        self
    }
}

impl<E: Endpoint> Middleware<E> for SetHeader {
    type Output = SetHeaderEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        SetHeaderEndpoint {
            inner: ep,
            config: self.clone(),
        }
    }
}

/// Endpoint for the [`SetHeader`] middleware.
pub struct SetHeaderEndpoint<E> {
    inner: E,
    config: SetHeader,
}

#[async_trait::async_trait]
impl<E: Endpoint> Endpoint for SetHeaderEndpoint<E> {
    async fn call(&self, req: Request) -> Response {
        let mut resp = self.inner.call(req).await;
        let headers = resp.headers_mut();

        for (name, value) in &self.config.overrides {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.config.appends {
            headers.append(name.clone(), value.clone());
        }

        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{endpoint::make_sync, EndpointExt};

    fn values(resp: &Response, name: &str) -> Vec<String> {
        resp.headers()
            .get_all(name)
            .into_iter()
            .filter_map(|value| value.to_str().ok())
            .map(ToString::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_set_header() {
        let resp = make_sync(|_| "hello")
            .with(
                SetHeader::new()
                    .overriding("custom-a", "a")
                    .overriding("custom-a", "b")
                    .appending("custom-b", "a")
                    .appending("custom-b", "b"),
            )
            .call(Request::default())
            .await;

        assert_eq!(values(&resp, "custom-a"), vec!["b"]);
        assert_eq!(values(&resp, "custom-b"), vec!["a", "b"]);
    }
}
