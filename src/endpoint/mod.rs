//! Endpoint related types.

#[allow(clippy::module_inception)]
mod endpoint;
mod fallback;

pub use endpoint::{make, make_sync, BoxEndpoint, Endpoint, EndpointExt};
pub(crate) use fallback::{AutomaticOptions, MethodNotAllowed, NotFound};
