//! Route groups: shared path prefix + shared middleware.
//!
//! A group buffers its registrations instead of writing them into the router
//! immediately, because its middleware list may still grow after routes are
//! declared:
//!
//! ```rust
//! use trellis::{Application, Context};
//!
//! let mut app = Application::new();
//! let admin = app.group("/admin");
//! admin.get("/stats", |_c: Context| async { "stats" });
//! admin.wrap(trellis::middleware::trace()); // applies to /admin/stats too
//! ```
//!
//! The buffered routes reach the router through [`Group::apply`], a one-way
//! `Pending → Applied` transition the application performs for every group
//! before serving starts. Applying is idempotent — a second call is a no-op,
//! so the middleware chain is wrapped exactly once no matter how often the
//! application re-checks. Middleware added after the transition is ignored
//! and logged; it cannot affect routes that are already live.

use tracing::warn;

use crate::error::RouteError;
use crate::handler::{apply_middleware, Handler, HandlerFunc, MiddlewareFunc};
use crate::method::Method;
use crate::router::Router;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GroupState {
    Pending,
    Applied,
}

/// A deferred registration facade over the router.
///
/// Created with [`Application::group`](crate::Application::group). Routes
/// registered through it get the group's prefix prepended and, at apply
/// time, the group's middleware wrapped around them (first added outermost,
/// the same rule as everywhere else).
pub struct Group {
    prefix: String,
    middleware: Vec<MiddlewareFunc>,
    routes: Vec<(Method, String, HandlerFunc)>,
    subgroups: Vec<Group>,
    state: GroupState,
}

impl Group {
    pub(crate) fn new(prefix: &str, middleware: Vec<MiddlewareFunc>) -> Self {
        Self {
            prefix: prefix.to_owned(),
            middleware,
            routes: Vec::new(),
            subgroups: Vec::new(),
            state: GroupState::Pending,
        }
    }

    /// Adds middleware around every route of this group.
    ///
    /// May be called before or after the routes are registered — order
    /// relative to route registration does not matter, only the order of
    /// `wrap` calls themselves. Once the group has been applied, further
    /// calls are ignored.
    pub fn wrap(&mut self, middleware: MiddlewareFunc) -> &mut Self {
        if self.state == GroupState::Applied {
            warn!(prefix = %self.prefix, "group middleware added after apply; ignored");
            return self;
        }
        self.middleware.push(middleware);
        self
    }

    /// Registers a route under the group's prefix, with optional
    /// route-level middleware (wrapped innermost).
    pub fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        middleware: &[MiddlewareFunc],
    ) -> &mut Self {
        let handler = apply_middleware(handler.into_handler_func(), middleware);
        self.routes.push((method, join_paths(&self.prefix, path), handler));
        self
    }

    pub fn connect(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Connect, path, handler, &[])
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Delete, path, handler, &[])
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Get, path, handler, &[])
    }

    pub fn head(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Head, path, handler, &[])
    }

    pub fn options(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Options, path, handler, &[])
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Patch, path, handler, &[])
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Post, path, handler, &[])
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Put, path, handler, &[])
    }

    pub fn trace(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add(Method::Trace, path, handler, &[])
    }

    /// Registers a handler for every method.
    pub fn any(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        let handler = handler.into_handler_func();
        for method in Method::ALL {
            let handler = std::sync::Arc::clone(&handler);
            self.routes.push((method, join_paths(&self.prefix, path), handler));
        }
        self
    }

    /// A nested group. It snapshots this group's prefix and the middleware
    /// accumulated *so far* — middleware added to the parent afterwards
    /// affects only the parent's own routes.
    pub fn group(&mut self, prefix: &str) -> &mut Group {
        let child = Group::new(&join_paths(&self.prefix, prefix), self.middleware.clone());
        self.subgroups.push(child);
        self.subgroups.last_mut().expect("subgroup just pushed")
    }

    /// The `Pending → Applied` transition: wraps every buffered route in the
    /// group's middleware and hands it to the router. Idempotent — on an
    /// `Applied` group this is a no-op.
    pub(crate) fn apply(&mut self, router: &mut Router) -> Result<(), RouteError> {
        if self.state == GroupState::Applied {
            return Ok(());
        }
        self.state = GroupState::Applied;
        for (method, path, handler) in self.routes.drain(..) {
            let handler = apply_middleware(handler, &self.middleware);
            router.add_func(method, &path, handler)?;
        }
        for subgroup in &mut self.subgroups {
            subgroup.apply(router)?;
        }
        Ok(())
    }
}

/// Joins a group prefix and a route path on exactly one `/`.
fn join_paths(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    joined.push_str(prefix.trim_end_matches('/'));
    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}
