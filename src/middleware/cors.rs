//! Cross-origin resource sharing.
//!
//! Non-preflight requests get `access-control-allow-origin` (and friends)
//! stamped on whatever the wrapped handler produces. `OPTIONS` requests are
//! answered directly with `204 No Content` and the allow-lists — they never
//! reach the handler.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::{HandlerFunc, MiddlewareFunc};
use crate::method::Method;
use crate::middleware::{default_skipper, Skipper};
use crate::response::Outcome;
use crate::status::Status;

/// Configuration for [`cors_with_config`].
#[derive(Clone)]
pub struct CorsConfig {
    /// Requests to skip entirely (no CORS headers written).
    pub skipper: Skipper,
    /// Allowed origins. `"*"` allows any; a non-`*` entry also matches
    /// origins it is a prefix of.
    pub allow_origins: Vec<String>,
    /// Methods advertised on preflight.
    pub allow_methods: Vec<Method>,
    /// Headers advertised on preflight. When empty, the request's
    /// `access-control-request-headers` is echoed back.
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime in seconds; `0` omits the header.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            skipper: default_skipper(),
            allow_origins: vec!["*".to_owned()],
            allow_methods: vec![
                Method::Delete,
                Method::Get,
                Method::Head,
                Method::Patch,
                Method::Post,
                Method::Put,
            ],
            allow_headers: Vec::new(),
            allow_credentials: false,
            expose_headers: Vec::new(),
            max_age: 0,
        }
    }
}

/// CORS middleware with the default configuration: any origin, the six
/// common methods, no credentials.
pub fn cors() -> MiddlewareFunc {
    cors_with_config(CorsConfig::default())
}

/// CORS middleware with an explicit [`CorsConfig`].
pub fn cors_with_config(config: CorsConfig) -> MiddlewareFunc {
    Arc::new(move |next: HandlerFunc| {
        let config = config.clone();
        Arc::new(move |c: Context| {
            let next = Arc::clone(&next);
            let config = config.clone();
            Box::pin(async move {
                if (config.skipper)(&c) {
                    return next(c).await;
                }

                let origin = c.header("origin").unwrap_or_default().to_owned();
                let allow_origin = resolve_origin(&config, &origin);

                c.append_header("vary", "origin");
                if config.allow_credentials {
                    c.set_header("access-control-allow-credentials", "true");
                }

                if c.method() != Method::Options {
                    if let Some(allowed) = &allow_origin {
                        c.set_header("access-control-allow-origin", allowed);
                    }
                    if !config.expose_headers.is_empty() {
                        c.set_header(
                            "access-control-expose-headers",
                            &config.expose_headers.join(","),
                        );
                    }
                    return next(c).await;
                }

                // Preflight: answered here, without routing.
                c.append_header("vary", "access-control-request-method");
                c.append_header("vary", "access-control-request-headers");
                if let Some(allowed) = &allow_origin {
                    c.set_header("access-control-allow-origin", allowed);
                }
                c.set_header(
                    "access-control-allow-methods",
                    &config
                        .allow_methods
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                );
                if !config.allow_headers.is_empty() {
                    c.set_header("access-control-allow-headers", &config.allow_headers.join(","));
                } else if let Some(requested) = c.header("access-control-request-headers") {
                    let requested = requested.to_owned();
                    c.set_header("access-control-allow-headers", &requested);
                }
                if config.max_age > 0 {
                    c.set_header("access-control-max-age", &config.max_age.to_string());
                }
                c.set_status(Status::NoContent);
                Ok(Outcome::Empty)
            })
        })
    })
}

fn resolve_origin(config: &CorsConfig, origin: &str) -> Option<String> {
    for allowed in &config.allow_origins {
        if allowed == "*" && config.allow_credentials {
            // With credentials, `*` is not a legal header value; echo the
            // request origin instead.
            return Some(origin.to_owned());
        }
        if allowed == "*" || allowed == origin {
            return Some(allowed.clone());
        }
        if origin.is_empty() {
            return None;
        }
        if origin.starts_with(allowed.as_str()) {
            return Some(origin.to_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::context::Context;
    use bytes::Bytes;

    fn request(method: Method, target: &str, headers: &[(&str, &str)]) -> Context {
        let uri: http::Uri = target.parse().unwrap();
        Context::from_parts(
            method,
            &uri,
            headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            Bytes::new(),
        )
    }

    fn app() -> Arc<Application> {
        let mut app = Application::new();
        app.wrap(cors());
        app.get("/data", |_c: Context| async { "data" });
        app.options("/data", |_c: Context| async { "never reached" });
        Arc::new(app)
    }

    #[tokio::test]
    async fn simple_request_gets_allow_origin() {
        let c = request(Method::Get, "/data", &[("origin", "https://example.com")]);
        let response = app().handle(c).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(response.headers().get("vary").unwrap(), "origin");
    }

    #[tokio::test]
    async fn preflight_is_answered_without_routing() {
        let c = request(
            Method::Options,
            "/data",
            &[
                ("origin", "https://example.com"),
                ("access-control-request-headers", "x-token"),
            ],
        );
        let response = app().handle(c).await;
        assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get("access-control-allow-methods").unwrap(),
            "DELETE,GET,HEAD,PATCH,POST,PUT",
        );
        assert_eq!(
            response.headers().get("access-control-allow-headers").unwrap(),
            "x-token",
        );
    }

    #[tokio::test]
    async fn credentialed_wildcard_echoes_the_origin() {
        let mut config = CorsConfig::default();
        config.allow_credentials = true;
        let mut app = Application::new();
        app.wrap(cors_with_config(config));
        app.get("/data", |_c: Context| async { "data" });

        let c = request(Method::Get, "/data", &[("origin", "https://example.com")]);
        let response = Arc::new(app).handle(c).await;
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://example.com",
        );
        assert_eq!(
            response.headers().get("access-control-allow-credentials").unwrap(),
            "true",
        );
    }

    #[tokio::test]
    async fn disallowed_origin_gets_no_allow_header() {
        let config = CorsConfig {
            allow_origins: vec!["https://trusted.dev".to_owned()],
            ..CorsConfig::default()
        };
        let mut app = Application::new();
        app.wrap(cors_with_config(config));
        app.get("/data", |_c: Context| async { "data" });

        let c = request(Method::Get, "/data", &[("origin", "https://evil.example")]);
        let response = Arc::new(app).handle(c).await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
