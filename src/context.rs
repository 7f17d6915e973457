//! Per-request context: request data in, response state out.
//!
//! One [`Context`] is constructed per incoming request and threaded through
//! the middleware chain and the handler. It is a cheap handle — cloning it
//! clones an `Arc`, so middleware can keep a copy across the `next(c)` call
//! and inspect the response afterwards.
//!
//! The router writes matched path parameters into the context as a side
//! effect of [`Router::find`](crate::Router::find); handlers read them back
//! with [`param`](Context::param). Response writers (`string`, `json`,
//! `html`, `blob`, …) set the content type only if none is present yet, so
//! outer middleware may pre-empt it.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use cookie::Cookie;

use crate::exception::HttpException;
use crate::handler::HandlerResult;
use crate::method::Method;
use crate::response::{
    content_type_of, ResponseParts, MIME_HTML, MIME_JSON, MIME_TEXT,
};
use crate::status::Status;

/// The per-request context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    method: Method,
    path: Mutex<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: Mutex<HashMap<String, String>>,
    response: Mutex<ResponseParts>,
    store: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Context {
    /// A bare context from a method and a request target (path plus optional
    /// query string). This is all the router needs, which makes it handy for
    /// driving [`Router::find`](crate::Router::find) directly and in tests.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self::build(method, path.to_owned(), parse_query(query), Vec::new(), Bytes::new())
    }

    pub(crate) fn from_parts(
        method: Method,
        uri: &http::Uri,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        let query = uri.query().map(parse_query).unwrap_or_default();
        Self::build(method, uri.path().to_owned(), query, headers, body)
    }

    fn build(
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                method,
                path: Mutex::new(path),
                query,
                headers,
                body,
                params: Mutex::new(HashMap::new()),
                response: Mutex::new(ResponseParts::default()),
                store: Mutex::new(HashMap::new()),
            }),
        }
    }

    // ── Request ───────────────────────────────────────────────────────────────

    pub fn method(&self) -> Method {
        self.inner.method
    }

    /// The request path. Routing matches against this value, so a
    /// premiddleware that calls [`set_path`](Context::set_path) rewrites
    /// where the request goes.
    pub fn path(&self) -> String {
        lock(&self.inner.path).clone()
    }

    pub fn set_path(&self, path: impl Into<String>) {
        *lock(&self.inner.path) = path.into();
    }

    /// Case-insensitive request header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.inner.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    /// The first query parameter named `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.inner
            .query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.inner.query
    }

    /// A named path parameter bound by the router.
    ///
    /// For a route `/users/:id`, `c.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, name: &str) -> Option<String> {
        lock(&self.inner.params).get(name).cloned()
    }

    /// The text captured by a trailing `*` segment. Empty when the wildcard
    /// matched zero segments.
    pub fn wildcard(&self) -> Option<String> {
        self.param(crate::trie::WILDCARD_PARAM)
    }

    pub fn params(&self) -> HashMap<String, String> {
        lock(&self.inner.params).clone()
    }

    /// Router-side half of parameter binding. Overwrites prior bindings of
    /// the same name.
    pub(crate) fn bind_params(&self, bindings: Vec<(String, String)>) {
        let mut params = lock(&self.inner.params);
        for (name, value) in bindings {
            params.insert(name, value);
        }
    }

    /// Request cookies, parsed from every `Cookie` header.
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        let mut out = Vec::new();
        for (name, value) in &self.inner.headers {
            if name.eq_ignore_ascii_case("cookie") {
                for cookie in Cookie::split_parse(value.clone()).flatten() {
                    out.push(cookie.into_owned());
                }
            }
        }
        out
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies().into_iter().find(|c| c.name() == name)
    }

    // ── Request-scoped store ──────────────────────────────────────────────────

    /// Stores a value for later middleware/handlers in this request.
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        lock(&self.inner.store).insert(key.into(), Arc::new(value));
    }

    /// Retrieves a value stored with [`set`](Context::set). `None` when the
    /// key is absent or holds a different type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let value = lock(&self.inner.store).get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    // ── Response ──────────────────────────────────────────────────────────────

    pub fn status(&self) -> Option<Status> {
        lock(&self.inner.response).status
    }

    pub fn set_status(&self, status: Status) {
        lock(&self.inner.response).status = Some(status);
    }

    /// Replaces the response header `name`, or appends it if absent.
    pub fn set_header(&self, name: &str, value: &str) {
        lock(&self.inner.response).set_header(name, value);
    }

    /// Appends a response header, keeping existing values (`vary`,
    /// `set-cookie`, …).
    pub fn append_header(&self, name: &str, value: &str) {
        lock(&self.inner.response).append_header(name, value);
    }

    /// The first response header named `name` written so far.
    pub fn response_header(&self, name: &str) -> Option<String> {
        lock(&self.inner.response)
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Appends a `Set-Cookie` header to the response.
    pub fn set_cookie(&self, cookie: Cookie<'_>) {
        self.append_header("set-cookie", &cookie.to_string());
    }

    /// Writes a plain-text body. Status becomes 200 unless already set; use
    /// [`set_status`](Context::set_status) for anything else.
    pub fn string(&self, body: impl Into<String>) {
        self.write_body(body.into().into_bytes(), MIME_TEXT);
    }

    /// Writes an already-serialized JSON body.
    pub fn json(&self, body: impl Into<Vec<u8>>) {
        self.write_body(body.into(), MIME_JSON);
    }

    /// Writes an HTML body.
    pub fn html(&self, body: impl Into<String>) {
        self.write_body(body.into().into_bytes(), MIME_HTML);
    }

    /// Writes a binary body with an explicit content type.
    pub fn blob(&self, body: impl Into<Vec<u8>>, content_type: &str) {
        self.write_body(body.into(), content_type);
    }

    fn write_body(&self, body: Vec<u8>, content_type: &str) {
        let mut response = lock(&self.inner.response);
        response.write_content_type(content_type);
        if response.status.is_none() {
            response.status = Some(Status::Ok);
        }
        response.body = body;
    }

    /// Redirects to `url` with `302 Found`. Call
    /// [`set_status`](Context::set_status) afterwards for another 3xx code.
    pub fn redirect(&self, url: &str) {
        let mut response = lock(&self.inner.response);
        response.set_header("location", url);
        response.status = Some(Status::Found);
    }

    /// Serves the file at `filepath`, inferring the content type from the
    /// extension. A missing or unreadable file is a 404.
    pub async fn file(&self, filepath: impl AsRef<Path>) -> HandlerResult {
        let filepath = filepath.as_ref();
        match tokio::fs::read(filepath).await {
            Ok(body) => {
                self.blob(body, content_type_of(&filepath.to_string_lossy()));
                Ok(crate::response::Outcome::Empty)
            }
            Err(_) => Err(HttpException::not_found()),
        }
    }

    pub(crate) fn take_response(&self) -> ResponseParts {
        std::mem::take(&mut *lock(&self.inner.response))
    }
}

// ── Query string parsing ──────────────────────────────────────────────────────

fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'+' {
            out.push(b' ');
            i += 1;
        } else if bytes[i] == b'%' && i + 2 < bytes.len() {
            match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
