//! Request-time error values.
//!
//! Handlers and middleware return `Err(HttpException)` to short-circuit a
//! request with an error response. The application layer translates the
//! exception into a JSON body — it never escapes the dispatch pipeline as a
//! Rust error.
//!
//! ```rust
//! use trellis::{Context, HandlerResult, HttpException, Outcome};
//!
//! async fn get_user(c: Context) -> HandlerResult {
//!     let id = c.param("id").ok_or_else(HttpException::bad_request)?;
//!     if id != "42" {
//!         return Err(HttpException::not_found());
//!     }
//!     Ok(Outcome::Json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
//! }
//! ```

use std::fmt;

use crate::status::Status;

/// An HTTP error carried as a value through the handler pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpException {
    status: Status,
    message: String,
}

impl HttpException {
    /// An exception with a custom message.
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// An exception whose message is the status reason phrase.
    pub fn from_status(status: Status) -> Self {
        Self { status, message: status.reason().to_owned() }
    }

    pub fn bad_request() -> Self {
        Self::from_status(Status::BadRequest)
    }

    pub fn unauthorized() -> Self {
        Self::from_status(Status::Unauthorized)
    }

    pub fn forbidden() -> Self {
        Self::from_status(Status::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::from_status(Status::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_status(Status::MethodNotAllowed)
    }

    pub fn internal_server_error() -> Self {
        Self::from_status(Status::InternalServerError)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The JSON error body: `{"status":404,"message":"Not Found"}`.
    pub(crate) fn body_json(&self) -> Vec<u8> {
        format!(
            r#"{{"status":{},"message":"{}"}}"#,
            self.status.code(),
            json_escape(&self.message),
        )
        .into_bytes()
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.code(), self.message)
    }
}

impl std::error::Error for HttpException {}

/// Lets handlers use `?` on filesystem operations. A missing file is a 404;
/// anything else is a 500.
impl From<std::io::Error> for HttpException {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(),
            _ => Self::internal_server_error(),
        }
    }
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_json_escapes_message() {
        let e = HttpException::new(Status::BadRequest, "bad \"name\"\n");
        assert_eq!(
            e.body_json(),
            br#"{"status":400,"message":"bad \"name\"\n"}"#.to_vec(),
        );
    }

    #[test]
    fn io_not_found_maps_to_404() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(HttpException::from(io).status(), Status::NotFound);
    }
}
