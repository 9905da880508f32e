//! Dispatch configuration.

use serde::Deserialize;

/// Switches controlling how a [`Mux`](crate::Mux) handles requests that do
/// not match any route.
///
/// Every field is optional when deserializing, missing fields take their
/// default value.
///
/// # Example
///
/// ```
/// use feather::{config::MuxConfig, Mux};
///
/// let config = MuxConfig {
///     handle_method_not_allowed: true,
///     ..MuxConfig::default()
/// };
/// let app = Mux::with_config(config);
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MuxConfig {
    /// Redirect to the lowercased path, or the path with its trailing slash
    /// toggled, when only that one is registered.
    ///
    /// Defaults to `true`.
    pub redirect_trailing_slash: bool,

    /// Answer `405 Method Not Allowed` with an `Allow` header when the path
    /// is registered for other methods.
    ///
    /// Defaults to `false`.
    pub handle_method_not_allowed: bool,

    /// Answer unregistered `OPTIONS` requests with the methods registered for
    /// the path.
    ///
    /// Defaults to `false`.
    pub automatic_options: bool,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            handle_method_not_allowed: false,
            automatic_options: false,
        }
    }
}
