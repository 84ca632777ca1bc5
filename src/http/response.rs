//! Action response module
//!
//! `ActionResponse` is the internal, pre-transport response every handler
//! returns. Builders for the fixed responses live here too.

use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;

/// Status, headers and an optional binary body
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ActionResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Content-Type header, if present and readable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Body length in bytes (0 when absent)
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Build 304 Not Modified response carrying the validator headers, no body
pub fn build_304_response(headers: HeaderMap) -> ActionResponse {
    ActionResponse {
        status: StatusCode::NOT_MODIFIED,
        headers,
        body: None,
    }
}

/// Build 404 Not Found response
pub fn build_404_response() -> ActionResponse {
    plain_text(StatusCode::NOT_FOUND, "Not Found")
}

/// Build 500 response for a missing or broken deployment setting
pub fn build_config_error_response(message: &str) -> ActionResponse {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Build 308 Permanent Redirect response
///
/// The target is used byte-for-byte; returns `None` when it cannot be carried
/// in a header (control characters).
pub fn build_permanent_redirect(target: &str) -> Option<ActionResponse> {
    let location = HeaderValue::from_bytes(target.as_bytes()).ok()?;
    Some(ActionResponse::new(StatusCode::PERMANENT_REDIRECT).with_header(header::LOCATION, location))
}

fn plain_text(status: StatusCode, body: &str) -> ActionResponse {
    ActionResponse::new(status)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_body(Bytes::copy_from_slice(body.as_bytes()))
}
