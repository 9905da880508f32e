//! Some common error types.

use std::{io::Error as IoError, string::FromUtf8Error};

/// A possible error value occurred when adding a route.
///
/// Every variant carries the pattern that was being registered.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The pattern does not begin with `/` or contains an empty segment.
    #[error("invalid path '{0}': a path must begin with '/' and must not contain '//'")]
    InvalidPath(String),

    /// The pattern could not be percent-decoded.
    #[error("invalid path '{0}': percent-decoding failed")]
    Decode(String),

    /// A `:` marker is not followed by a name.
    #[error("wildcards must be named with a non-empty name in path '{0}'")]
    MissingParamName(String),

    /// More than one wildcard in a single path segment.
    #[error("only one wildcard per path segment is allowed, has '{segment}' in path '{path}'")]
    MultipleWildcards {
        /// The offending segment.
        segment: String,
        /// The registered pattern.
        path: String,
    },

    /// A catch-all which is not the last segment or not preceded by `/`.
    #[error("catch-all must be the final '/*' of the path '{0}'")]
    InvalidCatchAll(String),

    /// The same parameter name appears twice in one pattern.
    #[error("duplicate param name '{name}' detected for route '{path}'")]
    DuplicateParam {
        /// The repeated name.
        name: String,
        /// The registered pattern.
        path: String,
    },

    /// The pattern declares more than 255 parameters.
    #[error("too many params in path '{0}', at most 255 are allowed")]
    TooManyParams(String),

    /// A wildcard collides with static routes, or the other way around.
    #[error("path segment '{segment}' conflicts with existing wildcard or children in path '{path}'")]
    WildcardConflict {
        /// The part of the pattern that could not be inserted.
        segment: String,
        /// The registered pattern.
        path: String,
    },

    /// A catch-all would shadow a route ending with `/` at the same place.
    #[error("catch-all conflicts with existing handle for the path segment root in path '{0}'")]
    CatchAllConflict(String),

    /// A handler is already registered for the pattern.
    #[error("handlers are already registered for path '{0}'")]
    Duplicate(String),
}

impl RouteError {
    /// Returns the pattern which caused this error.
    pub fn path(&self) -> &str {
        match self {
            RouteError::InvalidPath(path)
            | RouteError::Decode(path)
            | RouteError::MissingParamName(path)
            | RouteError::InvalidCatchAll(path)
            | RouteError::TooManyParams(path)
            | RouteError::CatchAllConflict(path)
            | RouteError::Duplicate(path) => path,
            RouteError::MultipleWildcards { path, .. }
            | RouteError::DuplicateParam { path, .. }
            | RouteError::WildcardConflict { path, .. } => path,
        }
    }
}

/// A possible error value when reading the body.
#[derive(Debug, thiserror::Error)]
pub enum ReadBodyError {
    /// Body is not a valid utf8 string.
    #[error("parse utf8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Io error.
    #[error("io: {0}")]
    Io(#[from] IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_message_names_path() {
        let err = RouteError::DuplicateParam {
            name: "id".to_string(),
            path: "/a/:id/b/:id".to_string(),
        };
        assert_eq!(err.path(), "/a/:id/b/:id");
        assert_eq!(
            err.to_string(),
            "duplicate param name 'id' detected for route '/a/:id/b/:id'"
        );
        assert_eq!(
            RouteError::Duplicate("/x".to_string()).to_string(),
            "handlers are already registered for path '/x'"
        );
    }
}
