//! Feather is a fast HTTP request router built on a compressed radix tree.
//!
//! Every HTTP method has its own tree. Routes are checked when they are
//! registered, so two routes can never match the same path and a lookup never
//! backtracks. Matching a static route allocates nothing, and the parameters
//! of dynamic routes are captured into buffers reused across requests.
//!
//! # Patterns
//!
//! |Pattern           |Matches                          |Captures              |
//! |------------------|---------------------------------|----------------------|
//! |`/about`          |`/about`                         |                      |
//! |`/user/:id`       |`/user/42`, not `/user/42/posts` |`id = "42"`           |
//! |`/static/*`       |`/static/css/a.css`              |`*wildcard = "css/a.css"` |
//!
//! # Example
//!
//! ```no_run
//! use feather::{endpoint::make_sync, Mux, Request, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Mux::new()
//!         .get(
//!             "/hello/:name",
//!             make_sync(|req: Request| format!("hello: {}", req.param("name"))),
//!         )
//!         .handle_method_not_allowed(true);
//!
//!     let server = Server::bind("127.0.0.1:3000").await.unwrap();
//!     server.run(app).await.unwrap();
//! }
//! ```
//!
//! # Unmatched requests
//!
//! - A path which only matches once lowercased, or once its trailing slash is
//!   added or removed, is redirected with `301` for `GET` and `308` otherwise.
//! - With [`Mux::handle_method_not_allowed`], a path registered for other
//!   methods gets `405` with an `Allow` header.
//! - With [`Mux::handle_automatic_options`], `OPTIONS` requests are answered
//!   with the methods registered for the path.

#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod middleware;
pub mod route;

#[doc(inline)]
pub use http;

mod body;
mod request;
mod response;
mod server;

pub use async_trait::async_trait;
pub use body::Body;
pub use config::MuxConfig;
pub use endpoint::{Endpoint, EndpointExt};
pub use error::RouteError;
pub use middleware::Middleware;
pub use request::{Request, RequestBuilder};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use route::{Mux, WILDCARD_PARAM};
pub use server::Server;
