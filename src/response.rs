//! Handler outcomes and response assembly.
//!
//! A handler reports what it produced as a tagged [`Outcome`] — there is no
//! runtime inspection of return values. The application serializes the
//! outcome into the context's response unless the handler already wrote one
//! directly (see the writers on [`Context`](crate::Context)).
//!
//! ```rust
//! use trellis::{Context, Outcome};
//!
//! async fn hello(_c: Context) -> Outcome {
//!     Outcome::Html("<h1>hi</h1>".into())
//! }
//!
//! // bytes from your serialiser — trellis doesn't care how you build them:
//! //   serde_json::to_vec(&user).unwrap()
//! //   format!(r#"{{"id":"{id}"}}"#).into_bytes()
//! async fn user(_c: Context) -> Outcome {
//!     Outcome::Json(br#"{"id":"42"}"#.to_vec())
//! }
//! ```

use bytes::Bytes;
use http_body_util::Full;
use tracing::error;

use crate::exception::HttpException;
use crate::handler::HandlerResult;
use crate::status::Status;

pub(crate) const MIME_JSON: &str = "application/json";
pub(crate) const MIME_HTML: &str = "text/html; charset=utf-8";
pub(crate) const MIME_TEXT: &str = "text/plain; charset=utf-8";
pub(crate) const MIME_OCTET: &str = "application/octet-stream";

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a handler produced, tagged by response kind.
///
/// `Json` and `Bytes` carry raw bytes: trellis is serializer-agnostic, so
/// pass the output of whatever produces your JSON. `Empty` means the handler
/// wrote the response through the context (or has no body to send).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// `application/octet-stream`.
    Bytes(Vec<u8>),
    /// `application/json`, already serialized.
    Json(Vec<u8>),
    /// `text/html; charset=utf-8`.
    Html(String),
    /// `text/plain; charset=utf-8`.
    Text(String),
    /// Nothing to serialize.
    Empty,
}

// ── IntoHandlerResult ─────────────────────────────────────────────────────────

/// Conversion into a [`HandlerResult`], so handlers can return plain values.
///
/// Implemented for [`Outcome`], `&'static str` and `String` (plain text),
/// `Vec<u8>` (raw bytes), `()` (empty), and `Result<T, HttpException>` of
/// any of those.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for Outcome {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoHandlerResult for &'static str {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Outcome::Text(self.to_owned()))
    }
}

impl IntoHandlerResult for String {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Outcome::Text(self))
    }
}

impl IntoHandlerResult for Vec<u8> {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Outcome::Bytes(self))
    }
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Outcome::Empty)
    }
}

impl<T: IntoHandlerResult> IntoHandlerResult for Result<T, HttpException> {
    fn into_handler_result(self) -> HandlerResult {
        self.and_then(IntoHandlerResult::into_handler_result)
    }
}

// ── ResponseParts ─────────────────────────────────────────────────────────────

/// The response under construction, owned by the request's context.
#[derive(Default)]
pub(crate) struct ResponseParts {
    pub(crate) status: Option<Status>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl ResponseParts {
    /// Sets the content type only if none was written yet.
    pub(crate) fn write_content_type(&mut self, value: &str) {
        if !self.has_header("content-type") {
            self.headers.push(("content-type".to_owned(), value.to_owned()));
        }
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Replaces every header named `name`, or appends if absent.
    pub(crate) fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    pub(crate) fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let status = self.status.unwrap_or(Status::Ok);
        let mut builder = http::Response::builder().status(status.code());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Full::new(Bytes::from(self.body))) {
            Ok(response) => response,
            Err(e) => {
                error!("invalid response headers: {e}");
                http::Response::builder()
                    .status(Status::InternalServerError.code())
                    .body(Full::default())
                    .expect("bare 500 response")
            }
        }
    }
}

// ── Content types for static files ────────────────────────────────────────────

/// Content type by file extension, for [`Context::file`](crate::Context::file).
pub(crate) fn content_type_of(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext {
        "css"          => "text/css; charset=utf-8",
        "csv"          => "text/csv",
        "gif"          => "image/gif",
        "htm" | "html" => MIME_HTML,
        "ico"          => "image/x-icon",
        "jpeg" | "jpg" => "image/jpeg",
        "js" | "mjs"   => "text/javascript; charset=utf-8",
        "json"         => MIME_JSON,
        "pdf"          => "application/pdf",
        "png"          => "image/png",
        "svg"          => "image/svg+xml",
        "txt"          => MIME_TEXT,
        "wasm"         => "application/wasm",
        "xml"          => "application/xml",
        _              => MIME_OCTET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_written_once() {
        let mut parts = ResponseParts::default();
        parts.write_content_type(MIME_JSON);
        parts.write_content_type(MIME_TEXT);
        assert_eq!(parts.headers, [("content-type".to_owned(), MIME_JSON.to_owned())]);
    }

    #[test]
    fn into_http_defaults_to_200() {
        let response = ResponseParts::default().into_http();
        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(content_type_of("assets/js/main.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type_of("README"), MIME_OCTET);
    }
}
