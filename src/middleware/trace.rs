//! Per-request tracing.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::context::Context;
use crate::handler::{HandlerFunc, MiddlewareFunc};

/// Logs one line per request: method, path, status, latency.
///
/// Register it with [`pre`](crate::Application::pre) to cover misses too,
/// or [`wrap`](crate::Application::wrap) to log only routed requests.
pub fn trace() -> MiddlewareFunc {
    Arc::new(|next: HandlerFunc| {
        Arc::new(move |c: Context| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let start = Instant::now();
                let method = c.method();
                let path = c.path();

                let result = next(c.clone()).await;

                let status = match &result {
                    Ok(_) => c.status().map(|s| s.code()).unwrap_or(200),
                    Err(e) => e.status().code(),
                };
                info!(
                    method = %method,
                    path = %path,
                    status = status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "request"
                );
                result
            })
        })
    })
}
