use std::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

use crate::{
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Extensions, Method, Uri, Version,
    },
    route::{PathParams, PooledParams, WILDCARD_PARAM},
    Body,
};

/// Represents an HTTP request.
///
/// When the request was routed by a [`Mux`](crate::Mux), the parameters
/// captured from the path are stored in the request itself and can be read
/// with [`Request::param`] and [`Request::wildcard`].
#[derive(Default)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: Body,
    params: Option<PooledParams>,
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("params", &self.params())
            .finish()
    }
}

impl From<hyper::Request<hyper::Body>> for Request {
    fn from(req: hyper::Request<hyper::Body>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            extensions: parts.extensions,
            body: Body(body),
            params: None,
        }
    }
}

impl Request {
    /// Creates a new `RequestBuilder` initialized with a GET method and root
    /// uri.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            uri: Uri::from_static("/"),
            version: Version::default(),
            headers: HeaderMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Returns a reference to the associated HTTP method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns a reference to the associated URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the associated version.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns a reference to the associated header map.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a reference to the associated extensions.
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Take the body from this request and sets the body to empty.
    #[inline]
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Returns the value of the path parameter `name`, or an empty string if
    /// the matched route has no such parameter.
    ///
    /// # Example
    ///
    /// ```
    /// use feather::{endpoint::make_sync, Mux, Request};
    ///
    /// let app = Mux::new().get(
    ///     "/user/:id",
    ///     make_sync(|req: Request| format!("USER_ID:{}", req.param("id"))),
    /// );
    /// ```
    pub fn param(&self, name: &str) -> &str {
        self.params
            .as_deref()
            .and_then(|params| params.get(name))
            .unwrap_or_default()
    }

    /// Returns the remainder of the path captured by a trailing `/*`.
    #[inline]
    pub fn wildcard(&self) -> &str {
        self.param(WILDCARD_PARAM)
    }

    /// Returns all the parameters captured from the path, in path order.
    pub fn params(&self) -> &PathParams {
        match &self.params {
            Some(params) => params,
            None => PathParams::empty(),
        }
    }

    pub(crate) fn set_params(&mut self, params: PooledParams) {
        self.params = Some(params);
    }
}

/// An request builder.
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RequestBuilder {
    /// Sets the HTTP method for this request.
    ///
    /// By default this is [`Method::GET`].
    #[must_use]
    pub fn method(self, method: Method) -> RequestBuilder {
        Self { method, ..self }
    }

    /// Sets the URI for this request.
    ///
    /// By default this is `/`.
    #[must_use]
    pub fn uri(self, uri: Uri) -> RequestBuilder {
        Self { uri, ..self }
    }

    /// Sets the URI for this request from a string.
    ///
    /// An unparsable URI leaves the current one in place.
    #[must_use]
    pub fn uri_str(self, uri: &str) -> RequestBuilder {
        match uri.parse() {
            Ok(uri) => Self { uri, ..self },
            Err(_) => self,
        }
    }

    /// Sets the HTTP version for this request.
    #[must_use]
    pub fn version(self, version: Version) -> RequestBuilder {
        Self { version, ..self }
    }

    /// Appends a header to this request builder.
    ///
    /// Invalid header names or values are ignored.
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (key.try_into(), value.try_into()) {
            self.headers.append(key, value);
        }
        self
    }

    /// Sets the `Content-Type` header on the request.
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header(header::CONTENT_TYPE, content_type)
    }

    /// Adds an extension to this request.
    #[must_use]
    pub fn extension<T>(mut self, extension: T) -> Self
    where
        T: Any + Send + Sync + 'static,
    {
        self.extensions.insert(extension);
        self
    }

    /// Consumes this builder, using the provided body to return a constructed
    /// [`Request`].
    pub fn body(self, body: impl Into<Body>) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            version: self.version,
            headers: self.headers,
            extensions: self.extensions,
            body: body.into(),
            params: None,
        }
    }

    /// Consumes this builder to return a constructed [`Request`] with an
    /// empty body.
    pub fn finish(self) -> Request {
        self.body(Body::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_without_route_is_blank() {
        let req = Request::builder().uri_str("/user/42").finish();
        assert_eq!(req.param("id"), "");
        assert_eq!(req.wildcard(), "");
        assert!(req.params().is_empty());
    }

    #[tokio::test]
    async fn test_builder() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri_str("/a?b=1")
            .version(Version::HTTP_2)
            .header("x-value", "1")
            .content_type("text/plain")
            .extension(10i32)
            .body("hello");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().path(), "/a");
        assert_eq!(req.uri().query(), Some("b=1"));
        assert_eq!(req.version(), Version::HTTP_2);
        assert_eq!(req.headers().get("x-value").unwrap(), "1");
        assert_eq!(req.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(req.extensions().get::<i32>(), Some(&10));

        assert_eq!(req.take_body().into_string().await.unwrap(), "hello");
        assert_eq!(req.take_body().into_string().await.unwrap(), "");

        let req = Request::builder()
            .uri(Uri::from_static("/b"))
            .uri_str("not a uri")
            .finish();
        assert_eq!(req.uri().path(), "/b");
    }
}
