//! # trellis
//!
//! A minimal HTTP application toolkit. A trie router, a middleware model,
//! and a thin request context. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The router is the core: one segment trie per HTTP method, built at
//! startup, read-only while serving, O(path-length) lookup. Matching is
//! deterministic — at every depth a static segment beats a `:param`, which
//! beats a trailing `*`, and the walk never backtracks. A miss is a value
//! (the not-found handler), never an error.
//!
//! Everything else stays thin on purpose. Handlers get a [`Context`] and
//! return a tagged [`Outcome`] — trellis never inspects your bytes, so your
//! serializer is your business. Middleware is a plain function from handler
//! to handler; there is no trait to implement and no stack to learn.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{Application, Context, Outcome, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Application::new();
//!     app.wrap(trellis::middleware::trace());
//!     app.get("/hello", |_c: Context| async { "Hello, trellis!" });
//!     app.get("/users/:id", get_user);
//!     app.static_dir("/static", "assets");
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(c: Context) -> Outcome {
//!     let id = c.param("id").unwrap_or_default();
//!     // trellis sends bytes — it doesn't care how you build them:
//!     //   serde_json::to_vec(&user).unwrap()
//!     //   format!(r#"{{"id":"{id}"}}"#).into_bytes()
//!     Outcome::Json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//! ```
//!
//! ## Routes, groups, middleware
//!
//! Three pattern elements: static segments (`/users`), named parameters
//! (`/users/:id`), and a trailing wildcard (`/static/*`, capture via
//! [`Context::wildcard`]). Groups bundle a path prefix with shared
//! middleware:
//!
//! ```rust
//! use trellis::{Application, Context};
//!
//! let mut app = Application::new();
//! let api = app.group("/api");
//! api.get("/health", |_c: Context| async { "ok" });
//! api.wrap(trellis::middleware::cors());
//! ```
//!
//! Middleware runs in registration order, outermost first. `pre` middleware
//! wraps the router itself and sees every request, including 404s; `wrap`
//! middleware wraps the resolved handler.

mod app;
mod context;
mod error;
mod exception;
mod group;
mod handler;
mod method;
mod response;
mod router;
mod server;
mod status;
mod trie;

pub mod middleware;

pub use cookie::Cookie;

pub use app::Application;
pub use context::Context;
pub use error::{Error, RouteError};
pub use exception::HttpException;
pub use group::Group;
pub use handler::{
    apply_middleware, BoxFuture, Handler, HandlerFunc, HandlerResult, MiddlewareFunc,
};
pub use method::Method;
pub use response::{IntoHandlerResult, Outcome};
pub use router::Router;
pub use server::Server;
pub use status::Status;
