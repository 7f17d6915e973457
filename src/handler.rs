//! Handler and middleware function types, and the type erasure behind them.
//!
//! # How async handlers are stored
//!
//! The router needs to hold handlers of *different* types in a single trie.
//! Rust collections can only hold one concrete type, so handlers are erased
//! to a common shape before they are stored:
//!
//! ```text
//! async fn hello(c: Context) -> HandlerResult { … }    ← user writes this
//!        ↓ app.get("/", hello)
//! hello.into_handler_func()                            ← Handler blanket impl
//!        ↓
//! Arc<dyn Fn(Context) -> BoxFuture>  (= HandlerFunc)   ← stored in the trie
//!        ↓
//! handler(c)  at request time, one Arc clone per call
//! ```
//!
//! Middleware works on the erased shape directly: a [`MiddlewareFunc`] maps
//! one [`HandlerFunc`] to another. Because both sides are `Arc`s, a composed
//! chain is itself an ordinary handler and can be composed again.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::exception::HttpException;
use crate::response::{IntoHandlerResult, Outcome};

/// What a handler resolves to: a tagged [`Outcome`] or an
/// [`HttpException`] the application serializes as a JSON error.
pub type HandlerResult = Result<Outcome, HttpException>;

/// A heap-allocated, type-erased future that resolves to a [`HandlerResult`].
///
/// `Pin<Box<…>>` because the runtime polls the future in-place; `Send +
/// 'static` so tokio may move it across threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// A type-erased handler, shared across concurrent requests via `Arc`.
pub type HandlerFunc = Arc<dyn Fn(Context) -> BoxFuture + Send + Sync + 'static>;

/// A middleware: a transform from one handler to another.
///
/// The returned handler usually runs code before and/or after delegating to
/// the one it wraps:
///
/// ```rust
/// use std::sync::Arc;
/// use trellis::{Context, HandlerFunc, MiddlewareFunc};
///
/// fn require_header(name: &'static str) -> MiddlewareFunc {
///     Arc::new(move |next: HandlerFunc| {
///         Arc::new(move |c: Context| {
///             let next = Arc::clone(&next);
///             Box::pin(async move {
///                 if c.header(name).is_none() {
///                     return Err(trellis::HttpException::bad_request());
///                 }
///                 next(c).await
///             })
///         })
///     })
/// }
/// ```
pub type MiddlewareFunc = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync + 'static>;

/// Wraps `handler` in `middleware` so that index 0 ends up outermost.
///
/// The first-registered middleware runs first on the way in and last on the
/// way out. Every middleware list in the crate — `pre`, `wrap`, group, and
/// route-level — composes with this one function, so the ordering rule is
/// uniform.
pub fn apply_middleware(handler: HandlerFunc, middleware: &[MiddlewareFunc]) -> HandlerFunc {
    middleware.iter().rev().fold(handler, |h, m| m(h))
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(c: Context) -> impl IntoHandlerResult
/// ```
///
/// so all of these are handlers:
///
/// ```rust
/// use trellis::{Context, HandlerResult, Outcome};
///
/// async fn text(_c: Context) -> &'static str { "ok" }
/// async fn tagged(_c: Context) -> Outcome { Outcome::Html("<p>hi</p>".into()) }
/// async fn fallible(c: Context) -> HandlerResult {
///     let body = tokio::fs::read("motd.txt").await?;
///     Ok(Outcome::Bytes(body))
/// }
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_handler_func(self) -> HandlerFunc;
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `Handler` on their own types.
mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn into_handler_func(self) -> HandlerFunc {
        Arc::new(move |c: Context| {
            let fut = (self)(c);
            Box::pin(async move { fut.await.into_handler_result() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use std::sync::Mutex;

    fn probe(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> MiddlewareFunc {
        Arc::new(move |next: HandlerFunc| {
            let log = Arc::clone(&log);
            Arc::new(move |c: Context| {
                let log = Arc::clone(&log);
                let next = Arc::clone(&next);
                Box::pin(async move {
                    log.lock().unwrap().push(format!("{label}-enter"));
                    let result = next(c).await;
                    log.lock().unwrap().push(format!("{label}-exit"));
                    result
                })
            })
        })
    }

    #[tokio::test]
    async fn first_registered_middleware_runs_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = {
            let log = Arc::clone(&log);
            (move |_c: Context| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push("handler".to_owned());
                    Outcome::Empty
                }
            })
            .into_handler_func()
        };

        let chain = apply_middleware(
            handler,
            &[probe("a", Arc::clone(&log)), probe("b", Arc::clone(&log))],
        );
        chain(Context::new(Method::Get, "/")).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            ["a-enter", "b-enter", "handler", "b-exit", "a-exit"],
        );
    }

    #[tokio::test]
    async fn plain_string_handlers_are_accepted() {
        let handler = (|_c: Context| async { "ok" }).into_handler_func();
        let outcome = handler(Context::new(Method::Get, "/")).await.unwrap();
        assert_eq!(outcome, Outcome::Text("ok".to_owned()));
    }
}
