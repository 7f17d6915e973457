//! Error types.
//!
//! Two very different failure classes live here:
//!
//! - [`Error`] — infrastructure failures while serving: binding to a port or
//!   accepting a connection.
//! - [`RouteError`] — configuration errors detected while *registering*
//!   routes. These never occur mid-serving: the routing table is fully built
//!   before the listener accepts its first connection.
//!
//! Request-time failures (404, 422, …) are neither — they are expressed as
//! [`HttpException`](crate::HttpException) values returned by handlers.

use std::fmt;

/// The error type returned by trellis's fallible serving operations.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

/// A route registration error.
///
/// Reported at `add` time, never per-request. [`Router::add`](crate::Router::add)
/// panics on these with the message below; [`Router::try_add`](crate::Router::try_add)
/// surfaces them as a `Result` instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RouteError {
    /// The path does not start with `/` (includes the empty path).
    NotAbsolute { path: String },
    /// A `*` segment appeared anywhere but the final position.
    WildcardNotLast { path: String },
    /// A `:` segment with nothing after the marker.
    EmptyParamName { path: String },
    /// A parameter at a position where an earlier route bound a different
    /// name. One parameter slot exists per trie node, so the name must be
    /// consistent per position.
    ParamNameConflict {
        path: String,
        existing: String,
        conflicting: String,
    },
    /// A second handler registered for an identical pattern.
    DuplicateRoute { path: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAbsolute { path } => {
                write!(f, "path `{path}` must start with `/`")
            }
            Self::WildcardNotLast { path } => {
                write!(f, "wildcard in `{path}` must be the final segment")
            }
            Self::EmptyParamName { path } => {
                write!(f, "parameter segment in `{path}` is missing a name")
            }
            Self::ParamNameConflict { path, existing, conflicting } => {
                write!(
                    f,
                    "parameter `:{conflicting}` in `{path}` conflicts with `:{existing}` \
                     registered at the same position"
                )
            }
            Self::DuplicateRoute { path } => {
                write!(f, "route `{path}` is already registered")
            }
        }
    }
}

impl std::error::Error for RouteError {}
