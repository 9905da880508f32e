//! Commonly used middleware.

mod set_header;

pub use set_header::{SetHeader, SetHeaderEndpoint};

use crate::Endpoint;

/// Represents a middleware trait.
///
/// Any `Fn(E) -> O` closure returning an [`Endpoint`] is a middleware too,
/// which makes one-off wrappers cheap to write:
///
/// ```
/// use feather::{endpoint::make_sync, http::StatusCode, Endpoint, EndpointExt};
///
/// fn teapot<E: Endpoint>(_: E) -> impl Endpoint {
///     make_sync(|_| StatusCode::IM_A_TEAPOT)
/// }
///
/// let ep = make_sync(|_| "hello").with(teapot);
/// ```
pub trait Middleware<E: Endpoint> {
    /// New endpoint type.
    ///
    /// If you don't know what type to use, then you can use
    /// [`BoxEndpoint`](crate::endpoint::BoxEndpoint).
    type Output: Endpoint;

    /// Transform the input [`Endpoint`] to another one.
    fn transform(&self, ep: E) -> Self::Output;
}

impl<E, F, O> Middleware<E> for F
where
    E: Endpoint,
    F: Fn(E) -> O,
    O: Endpoint,
{
    type Output = O;

    fn transform(&self, ep: E) -> Self::Output {
        (self)(ep)
    }
}
