//! The application: registration facade + request dispatch pipeline.
//!
//! # Composition order, per request
//!
//! ```text
//! pre middleware                 (runs even for requests that will 404,
//!        ↓                        and before the route is resolved)
//! routing (Router::find)
//!        ↓
//! wrap middleware                (wraps the resolved handler)
//!        ↓
//! group middleware               (wrapped in at group apply time)
//!        ↓
//! route-level middleware         (wrapped in at add time)
//!        ↓
//! handler
//! ```
//!
//! Within each list, index 0 is outermost: the first middleware registered
//! runs first on the way in and last on the way out. Routing is deferred
//! until the pre chain has run, so a premiddleware may rewrite
//! [`Context::path`](crate::Context::set_path) and change where the request
//! lands.
//!
//! Handlers report a tagged [`Outcome`]; if the handler did not set a
//! response status itself, the outcome decides body and content type. An
//! `Err(HttpException)` becomes a JSON error body.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use tracing::error;

use crate::context::Context;
use crate::exception::HttpException;
use crate::group::Group;
use crate::handler::{apply_middleware, Handler, HandlerFunc, HandlerResult, MiddlewareFunc};
use crate::method::Method;
use crate::response::{Outcome, MIME_OCTET};
use crate::router::Router;

/// An HTTP application: router, middleware lists, groups.
///
/// ```rust
/// use trellis::{Application, Context, Outcome};
///
/// let mut app = Application::new();
/// app.get("/hello", |_c: Context| async { "Hello, trellis!" });
/// app.get("/users/:id", |c: Context| async move {
///     Outcome::Json(format!(r#"{{"id":"{}"}}"#, c.param("id").unwrap_or_default()).into_bytes())
/// });
/// // Server::bind("0.0.0.0:8080").serve(app).await
/// ```
///
/// Registration happens before serving; [`Server::serve`](crate::Server::serve)
/// consumes the application, so the routing table cannot change while
/// requests are in flight.
pub struct Application {
    router: Router,
    premiddleware: Vec<MiddlewareFunc>,
    middleware: Vec<MiddlewareFunc>,
    groups: Vec<Group>,
}

impl Application {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            premiddleware: Vec::new(),
            middleware: Vec::new(),
            groups: Vec::new(),
        }
    }

    // ── Middleware registration ───────────────────────────────────────────────

    /// Adds middleware that runs *before* routing, wrapping the entire
    /// pipeline. It sees every request, including ones that will 404.
    pub fn pre(&mut self, middleware: MiddlewareFunc) -> &mut Self {
        self.premiddleware.push(middleware);
        self
    }

    /// Adds middleware that wraps the resolved handler, after routing.
    pub fn wrap(&mut self, middleware: MiddlewareFunc) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    // ── Route registration ────────────────────────────────────────────────────

    /// Registers a route with optional route-level middleware, which wraps
    /// innermost — closest to the handler.
    ///
    /// # Panics
    ///
    /// Panics on configuration errors, like [`Router::add`].
    pub fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        middleware: &[MiddlewareFunc],
    ) -> &mut Self {
        let handler = apply_middleware(handler.into_handler_func(), middleware);
        self.router
            .add_func(method, path, handler)
            .unwrap_or_else(|e| panic!("invalid route: {e}"));
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
        self.on(&Method::ALL, path, handler)
    }

    /// Registers a handler for each of `methods` at once.
    pub fn on(&mut self, methods: &[Method], path: &str, handler: impl Handler) -> &mut Self {
        let handler = handler.into_handler_func();
        for method in methods {
            self.router
                .add_func(*method, path, Arc::clone(&handler))
                .unwrap_or_else(|e| panic!("invalid route: {e}"));
        }
        self
    }

    /// Replaces the handler returned on routing misses.
    pub fn not_found(&mut self, handler: impl Handler) -> &mut Self {
        self.router.set_not_found(handler);
        self
    }

    /// Creates a route group with a shared path prefix. Add middleware with
    /// [`Group::wrap`]; it is applied to the group's routes exactly once,
    /// when serving starts.
    pub fn group(&mut self, prefix: &str) -> &mut Group {
        self.groups.push(Group::new(prefix, Vec::new()));
        self.groups.last_mut().expect("group just pushed")
    }

    // ── Static files ──────────────────────────────────────────────────────────

    /// Serves files under `root` at `prefix/*`.
    ///
    /// A request for `/static/js/main.js` with `static_dir("/static",
    /// "assets")` reads `assets/js/main.js`. Captures that escape the root
    /// (absolute, `..`, `.`) are rejected as 404.
    pub fn static_dir(&mut self, prefix: &str, root: impl Into<PathBuf>) -> &mut Self {
        let root: PathBuf = root.into();
        let pattern = format!("{}/*", prefix.trim_end_matches('/'));
        self.get(&pattern, move |c: Context| {
            let root = root.clone();
            async move {
                let capture = c.wildcard().unwrap_or_default();
                let relative = capture.trim_start_matches('/');
                let traversal = Path::new(relative)
                    .components()
                    .any(|part| !matches!(part, Component::Normal(_)));
                if traversal {
                    return Err(HttpException::not_found());
                }
                c.file(root.join(relative)).await
            }
        })
    }

    /// Serves the single file at `filepath` for requests to `path`.
    pub fn file(&mut self, path: &str, filepath: impl Into<PathBuf>) -> &mut Self {
        let filepath: PathBuf = filepath.into();
        self.get(path, move |c: Context| {
            let filepath = filepath.clone();
            async move { c.file(filepath).await }
        })
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Applies every group's deferred prefix/middleware to the router.
    ///
    /// Idempotent; [`Server::serve`](crate::Server::serve) calls it before
    /// accepting the first connection, so the routing table is complete and
    /// read-only for the whole serving lifetime.
    ///
    /// # Panics
    ///
    /// Panics if a group route turns out to be a configuration error — the
    /// same policy as [`add`](Application::add).
    pub fn prepare(&mut self) {
        for group in &mut self.groups {
            if let Err(e) = group.apply(&mut self.router) {
                panic!("invalid group route: {e}");
            }
        }
    }

    /// Drives one request through the full pipeline and produces the
    /// response. This is the whole request lifecycle minus the network —
    /// useful for exercising an application in tests.
    ///
    /// Call [`prepare`](Application::prepare) first if groups were used and
    /// the application is not behind [`Server::serve`](crate::Server::serve).
    pub async fn handle(self: Arc<Self>, c: Context) -> http::Response<Full<Bytes>> {
        let handler = if self.premiddleware.is_empty() {
            let handler = self.router.find(c.method(), &c);
            apply_middleware(handler, &self.middleware)
        } else {
            // Routing must wait until the pre chain has run, so it lives
            // inside a deferred handler the pre middleware wraps.
            let app = Arc::clone(&self);
            let routed: HandlerFunc = Arc::new(move |c: Context| {
                let app = Arc::clone(&app);
                Box::pin(async move {
                    let handler = app.router.find(c.method(), &c);
                    let handler = apply_middleware(handler, &app.middleware);
                    handler(c).await
                })
            });
            apply_middleware(routed, &self.premiddleware)
        };

        let result = handler(c.clone()).await;
        transform_result(&c, result);
        c.take_response().into_http()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes the handler's outcome into the context's response.
///
/// The outcome only applies when the handler left the status unset — a
/// handler that wrote the response through the context already said
/// everything. Exceptions always win: status and JSON body are overwritten.
fn transform_result(c: &Context, result: HandlerResult) {
    match result {
        Err(e) => {
            if e.status().code() >= 500 {
                error!(status = e.status().code(), "handler error: {}", e.message());
            }
            c.set_status(e.status());
            c.json(e.body_json());
        }
        Ok(outcome) => {
            if c.status().is_none() {
                match outcome {
                    Outcome::Bytes(body) => c.blob(body, MIME_OCTET),
                    Outcome::Json(body) => c.json(body),
                    Outcome::Html(body) => c.html(body),
                    Outcome::Text(body) => c.string(body),
                    Outcome::Empty => c.set_status(crate::status::Status::Ok),
                }
            }
        }
    }
}
