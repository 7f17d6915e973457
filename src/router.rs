//! The request router.
//!
//! One segment trie per HTTP method, O(path-length) lookup. You register a
//! path, you get a handler back at request time. Matched path parameters are
//! written into the context as a side effect of [`Router::find`].
//!
//! `find` never fails: a miss — unknown method, unmatched path, or a prefix
//! with no handler — returns the not-found sentinel handler, which is an
//! ordinary handler you can replace with [`Router::set_not_found`]. Routing
//! failure is a normal outcome, not an error.
//!
//! Registration errors are the opposite: they are configuration bugs, and
//! [`Router::add`] fails loudly at startup rather than letting a broken
//! route sit in the table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::error::RouteError;
use crate::exception::HttpException;
use crate::handler::{BoxFuture, Handler, HandlerFunc};
use crate::method::Method;
use crate::trie::SegmentNode;

/// The application router.
///
/// Build it once at startup; it is read-only while serving. Direct use looks
/// like this — [`Application`](crate::Application) adds the method helpers
/// and middleware on top:
///
/// ```rust
/// use trellis::{Context, Method, Outcome, Router};
///
/// let mut router = Router::new();
/// router.add(Method::Get, "/users/:id", |c: Context| async move {
///     Outcome::Text(c.param("id").unwrap_or_default())
/// });
///
/// let c = Context::new(Method::Get, "/users/42");
/// let handler = router.find(Method::Get, &c);
/// assert_eq!(c.param("id").as_deref(), Some("42"));
/// # let _ = handler;
/// ```
pub struct Router {
    tries: HashMap<Method, SegmentNode>,
    not_found: HandlerFunc,
}

impl Router {
    pub fn new() -> Self {
        Self {
            tries: HashMap::new(),
            not_found: default_not_found(),
        }
    }

    /// Replaces the sentinel handler returned on lookup misses.
    pub fn set_not_found(&mut self, handler: impl Handler) {
        self.not_found = handler.into_handler_func();
    }

    /// The current not-found sentinel.
    pub fn not_found_handler(&self) -> HandlerFunc {
        Arc::clone(&self.not_found)
    }

    /// Registers a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern, a duplicate route, or an inconsistent
    /// parameter name — configuration errors that should stop startup, not
    /// surface per-request. Use [`try_add`](Router::try_add) to handle them
    /// as values.
    pub fn add(&mut self, method: Method, path: &str, handler: impl Handler) {
        self.try_add(method, path, handler)
            .unwrap_or_else(|e| panic!("invalid route: {e}"));
    }

    /// Registers a handler, surfacing configuration errors as a `Result`.
    pub fn try_add(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<(), RouteError> {
        self.add_func(method, path, handler.into_handler_func())
    }

    /// Registration on the erased handler type, for callers that already
    /// composed middleware around one.
    pub(crate) fn add_func(
        &mut self,
        method: Method,
        path: &str,
        handler: HandlerFunc,
    ) -> Result<(), RouteError> {
        self.tries.entry(method).or_default().insert(path, handler)
    }

    /// Resolves the handler for `(method, context.path)`.
    ///
    /// Matched parameters are bound into `c` before the handler is returned.
    /// Always returns a handler — on a miss, the not-found sentinel.
    pub fn find(&self, method: Method, c: &Context) -> HandlerFunc {
        let Some(root) = self.tries.get(&method) else {
            return Arc::clone(&self.not_found);
        };
        match root.lookup(&c.path()) {
            Some((handler, params)) => {
                c.bind_params(params);
                Arc::clone(handler)
            }
            None => Arc::clone(&self.not_found),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn default_not_found() -> HandlerFunc {
    Arc::new(|_c: Context| -> BoxFuture {
        Box::pin(async { Err(HttpException::not_found()) })
    })
}
