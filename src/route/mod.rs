//! Route table and dispatch.

mod mux;
mod params;
mod tree;

pub use mux::Mux;
pub use params::{PathParams, PooledParams, WILDCARD_PARAM};

use crate::error::RouteError;

pub(crate) fn check_result<T>(res: Result<T, RouteError>) -> T {
    match res {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}
