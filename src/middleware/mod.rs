//! Built-in middleware.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, CORS headers, request-id
//! injection, and authentication-header inspection.
//!
//! A middleware is just a [`MiddlewareFunc`](crate::MiddlewareFunc) — a
//! function from handler to handler — so writing your own needs no trait
//! impls; see the example on that type. The ones shipped here:
//!
//! - [`trace`] — per-request log line with method, path, status, latency
//! - [`cors`] — CORS headers and preflight handling

mod cors;
mod trace;

pub use cors::{cors, cors_with_config, CorsConfig};
pub use trace::trace;

use std::sync::Arc;

use crate::context::Context;

/// Decides whether a middleware should skip a request.
///
/// Returning `true` passes the request straight to the wrapped handler.
pub type Skipper = Arc<dyn Fn(&Context) -> bool + Send + Sync + 'static>;

/// The skipper used when none is configured: never skips.
pub fn default_skipper() -> Skipper {
    Arc::new(|_c: &Context| false)
}
