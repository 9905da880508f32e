use std::{borrow::Cow, sync::Arc};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::{
    check_result,
    params::{ParamPool, PooledParams},
    tree::Tree,
};
use crate::{
    config::MuxConfig,
    endpoint::{AutomaticOptions, BoxEndpoint, MethodNotAllowed, NotFound},
    error::RouteError,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    Endpoint, EndpointExt, Request, Response,
};

/// Bytes escaped when a corrected path is written to `Location`.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const ALL_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// What to do with a request, decided before anything is called.
enum Dispatch<'a> {
    Matched(&'a BoxEndpoint, Option<PooledParams>),
    Redirect(StatusCode, String),
    Options(Vec<Method>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// An HTTP request multiplexer backed by one radix tree per method.
///
/// Patterns are made of static text, named parameters (`/user/:id`) matching
/// one path segment, and a final catch-all (`/static/*`) matching the rest of
/// the path. Registrations which could make two routes match the same path
/// are rejected.
///
/// # Example
///
/// ```
/// use feather::{
///     endpoint::make_sync,
///     http::{Method, StatusCode},
///     Endpoint, Mux, Request,
/// };
///
/// let app = Mux::new()
///     .get("/", make_sync(|_| "index"))
///     .get(
///         "/user/:id",
///         make_sync(|req: Request| format!("user {}", req.param("id"))),
///     )
///     .get(
///         "/static/*",
///         make_sync(|req: Request| req.wildcard().to_string()),
///     );
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let resp = app
///     .call(Request::builder().uri_str("/user/42").finish())
///     .await;
/// assert_eq!(resp.status(), StatusCode::OK);
/// assert_eq!(resp.into_body().into_string().await.unwrap(), "user 42");
///
/// let resp = app
///     .call(Request::builder().uri_str("/user/42/").finish())
///     .await;
/// assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
/// # });
/// ```
pub struct Mux {
    trees: Vec<(Method, Tree<BoxEndpoint>)>,
    pool: Arc<ParamPool>,
    config: MuxConfig,
    not_found: BoxEndpoint,
    method_not_allowed: BoxEndpoint,
    automatic_options: BoxEndpoint,
}

impl Default for Mux {
    fn default() -> Self {
        Self::with_config(MuxConfig::default())
    }
}

impl Mux {
    /// Create a `Mux` with the default configuration.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a `Mux` with the specified configuration.
    pub fn with_config(config: MuxConfig) -> Self {
        Self {
            trees: Vec::new(),
            pool: Arc::new(ParamPool::new(0)),
            config,
            not_found: NotFound.boxed(),
            method_not_allowed: MethodNotAllowed.boxed(),
            automatic_options: AutomaticOptions.boxed(),
        }
    }

    /// Returns the current configuration.
    #[inline]
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    fn insert(&mut self, method: Method, pattern: &str, ep: BoxEndpoint) -> Result<(), RouteError> {
        let num_params = match self.trees.iter_mut().find(|(m, _)| *m == method) {
            Some((_, tree)) => tree.add(pattern, ep)?,
            None => {
                let mut tree = Tree::default();
                let num_params = tree.add(pattern, ep)?;
                self.trees.push((method.clone(), tree));
                num_params
            }
        };
        self.pool.reserve(num_params);
        tracing::debug!(method = %method, pattern, params = num_params, "route registered");
        Ok(())
    }

    fn try_methods<E>(
        mut self,
        methods: impl IntoIterator<Item = Method>,
        pattern: &str,
        ep: E,
    ) -> Result<Self, RouteError>
    where
        E: Endpoint + 'static,
    {
        let ep = Arc::new(ep);
        for method in methods {
            self.insert(method, pattern, ep.clone().boxed())?;
        }
        Ok(self)
    }

    /// Register an endpoint for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the pattern is malformed or collides
    /// with a route already registered for `method`. A malformed pattern
    /// leaves the mux untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use feather::{endpoint::make_sync, error::RouteError, http::Method, Mux};
    ///
    /// let res = Mux::new()
    ///     .get("/user/new", make_sync(|_| "new"))
    ///     .try_handle(Method::GET, "/user/:id", make_sync(|_| "user"));
    /// assert!(matches!(res, Err(RouteError::WildcardConflict { .. })));
    /// ```
    pub fn try_handle<E>(mut self, method: Method, pattern: &str, ep: E) -> Result<Self, RouteError>
    where
        E: Endpoint + 'static,
    {
        self.insert(method, pattern, ep.boxed())?;
        Ok(self)
    }

    /// Register an endpoint for `method` and `pattern`.
    ///
    /// # Panics
    ///
    /// Panics when [`Mux::try_handle`] would return an error.
    #[must_use]
    pub fn handle<E>(self, method: Method, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        check_result(self.try_handle(method, pattern, ep))
    }

    /// Register one endpoint for several methods.
    ///
    /// # Panics
    ///
    /// Panics if the pattern cannot be registered for one of the methods.
    #[must_use]
    pub fn methods<E>(self, methods: impl IntoIterator<Item = Method>, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        check_result(self.try_methods(methods, pattern, ep))
    }

    /// Register one endpoint for all the standard methods.
    #[must_use]
    pub fn any<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.methods(ALL_METHODS, pattern, ep)
    }

    /// Register an endpoint for `GET`.
    #[must_use]
    pub fn get<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::GET, pattern, ep)
    }

    /// Register an endpoint for `POST`.
    #[must_use]
    pub fn post<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::POST, pattern, ep)
    }

    /// Register an endpoint for `PUT`.
    #[must_use]
    pub fn put<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::PUT, pattern, ep)
    }

    /// Register an endpoint for `DELETE`.
    #[must_use]
    pub fn delete<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::DELETE, pattern, ep)
    }

    /// Register an endpoint for `PATCH`.
    #[must_use]
    pub fn patch<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::PATCH, pattern, ep)
    }

    /// Register an endpoint for `HEAD`.
    #[must_use]
    pub fn head<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::HEAD, pattern, ep)
    }

    /// Register an endpoint for `OPTIONS`.
    #[must_use]
    pub fn options<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::OPTIONS, pattern, ep)
    }

    /// Register an endpoint for `CONNECT`.
    #[must_use]
    pub fn connect<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::CONNECT, pattern, ep)
    }

    /// Register an endpoint for `TRACE`.
    #[must_use]
    pub fn trace<E>(self, pattern: &str, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.handle(Method::TRACE, pattern, ep)
    }

    /// Sets the endpoint called when no route matches.
    ///
    /// By default it responds `404 Not Found`.
    #[must_use]
    pub fn not_found<E>(mut self, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.not_found = ep.boxed();
        self
    }

    /// Sets the endpoint called when the path is only registered for other
    /// methods, and enables that check.
    ///
    /// The `Allow` header is added to whatever the endpoint returns.
    #[must_use]
    pub fn method_not_allowed<E>(mut self, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.method_not_allowed = ep.boxed();
        self.config.handle_method_not_allowed = true;
        self
    }

    /// Sets the endpoint answering unregistered `OPTIONS` requests, and
    /// enables automatic `OPTIONS` handling.
    ///
    /// The `Allow` header is added to whatever the endpoint returns.
    #[must_use]
    pub fn automatic_options<E>(mut self, ep: E) -> Self
    where
        E: Endpoint + 'static,
    {
        self.automatic_options = ep.boxed();
        self.config.automatic_options = true;
        self
    }

    /// Enables or disables redirects to the lowercased path or to the path
    /// with its trailing slash toggled.
    #[must_use]
    pub fn redirect_trailing_slash(mut self, enable: bool) -> Self {
        self.config.redirect_trailing_slash = enable;
        self
    }

    /// Enables or disables `405 Method Not Allowed` responses.
    #[must_use]
    pub fn handle_method_not_allowed(mut self, enable: bool) -> Self {
        self.config.handle_method_not_allowed = enable;
        self
    }

    /// Enables or disables automatic `OPTIONS` responses.
    #[must_use]
    pub fn handle_automatic_options(mut self, enable: bool) -> Self {
        self.config.automatic_options = enable;
        self
    }

    fn tree(&self, method: &Method) -> Option<&Tree<BoxEndpoint>> {
        self.trees
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, tree)| tree)
    }

    fn dispatch(&self, method: &Method, uri: &Uri) -> Dispatch<'_> {
        let raw_path = uri.path();
        let path = percent_decode_str(raw_path)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(raw_path));

        if let Some(tree) = self.tree(method) {
            if let Some(found) = tree.find(&path, &self.pool) {
                return Dispatch::Matched(found.handler, found.params);
            }

            if self.config.redirect_trailing_slash && path.len() > 1 {
                if let Some(corrected) = corrected_path(tree, &path) {
                    let status = if method == Method::GET {
                        StatusCode::MOVED_PERMANENTLY
                    } else {
                        StatusCode::PERMANENT_REDIRECT
                    };
                    let mut location = utf8_percent_encode(&corrected, PATH).to_string();
                    if let Some(query) = uri.query() {
                        location.push('?');
                        location.push_str(query);
                    }
                    return Dispatch::Redirect(status, location);
                }
            }
        }

        if self.config.automatic_options && method == Method::OPTIONS {
            let mut allow: Vec<Method> = self
                .trees
                .iter()
                .filter(|(m, tree)| {
                    m != Method::OPTIONS && (path == "*" || tree.contains(&path))
                })
                .map(|(m, _)| m.clone())
                .collect();
            allow.push(Method::OPTIONS);
            return Dispatch::Options(allow);
        }

        if self.config.handle_method_not_allowed {
            let allow: Vec<Method> = self
                .trees
                .iter()
                .filter(|(m, tree)| m != method && tree.contains(&path))
                .map(|(m, _)| m.clone())
                .collect();
            if !allow.is_empty() {
                return Dispatch::MethodNotAllowed(allow);
            }
        }

        Dispatch::NotFound
    }
}

/// Tries the lowercased path, then the lowercased path with its trailing
/// slash toggled.
fn corrected_path(tree: &Tree<BoxEndpoint>, path: &str) -> Option<String> {
    let mut lower = path.to_lowercase();
    if lower != path && tree.contains(&lower) {
        return Some(lower);
    }

    if lower.ends_with('/') {
        lower.pop();
    } else {
        lower.push('/');
    }
    if tree.contains(&lower) {
        return Some(lower);
    }
    None
}

fn append_allow(mut resp: Response, allow: &[Method]) -> Response {
    for method in allow {
        if let Ok(value) = HeaderValue::from_str(method.as_str()) {
            resp.headers_mut().append(header::ALLOW, value);
        }
    }
    resp
}

#[async_trait::async_trait]
impl Endpoint for Mux {
    async fn call(&self, mut req: Request) -> Response {
        match self.dispatch(req.method(), req.uri()) {
            Dispatch::Matched(ep, params) => {
                if let Some(params) = params {
                    req.set_params(params);
                }
                ep.call(req).await
            }
            Dispatch::Redirect(status, location) => {
                tracing::trace!(path = %req.uri(), location = %location, status = %status, "redirect");
                Response::builder()
                    .status(status)
                    .header(header::LOCATION, location)
                    .finish()
            }
            Dispatch::Options(allow) => {
                tracing::trace!(path = %req.uri(), allow = ?allow, "automatic options");
                append_allow(self.automatic_options.call(req).await, &allow)
            }
            Dispatch::MethodNotAllowed(allow) => {
                tracing::trace!(method = %req.method(), path = %req.uri(), allow = ?allow, "method not allowed");
                append_allow(self.method_not_allowed.call(req).await, &allow)
            }
            Dispatch::NotFound => {
                tracing::trace!(method = %req.method(), path = %req.uri(), "not found");
                self.not_found.call(req).await
            }
        }
    }
}
