//! Invocation envelope module
//!
//! The hosting runtime delivers each request as a JSON mapping instead of an
//! HTTP message, and expects a JSON mapping back. This module owns both shapes
//! and the conversions to and from the HTTP types the handlers work with.

use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Uri};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::error::{Error, Result};
use crate::http::encoding::{decode_request_body, TransportBody};
use crate::http::ActionResponse;
use crate::logger;

/// Inbound unit of work
///
/// Accepts the runtime's native `__ow_*` field names as well as plain names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvocationEnvelope {
    #[serde(rename = "__ow_method", alias = "method", default)]
    pub method: String,
    #[serde(rename = "__ow_headers", alias = "headers", default)]
    pub headers: HashMap<String, String>,
    /// Percent-encoded request path
    #[serde(rename = "__ow_path", alias = "path", default)]
    pub path: String,
    /// Query string without the leading `?`
    #[serde(rename = "__ow_query", alias = "query", default)]
    pub query: String,
    /// Base64-encoded request body
    #[serde(rename = "__ow_body", alias = "body", default)]
    pub body: Option<String>,
}

impl InvocationEnvelope {
    /// Request method, upper-cased; an empty method means `GET`
    pub fn method(&self) -> Result<Method> {
        if self.method.is_empty() {
            return Ok(Method::GET);
        }
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidRequest(format!("invalid method '{}'", self.method)))
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Headers as a `HeaderMap`, dropping entries that are not legal HTTP
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                (Ok(name), Ok(value)) => {
                    map.append(name, value);
                }
                _ => logger::log_warning(&format!("Dropping malformed request header '{name}'")),
            }
        }
        map
    }

    /// Canonical request URL, relative to the (not yet known) origin
    ///
    /// A path the URL parser cannot resolve is an invocation failure.
    pub fn request_url(&self) -> Result<RequestUrl> {
        RequestUrl::resolve(&self.path, &self.query)
            .map_err(|e| Error::InvalidRequest(format!("invalid path '{}': {e}", self.path)))
    }

    /// Decoded request body (empty when absent)
    pub fn decoded_body(&self) -> Bytes {
        self.body
            .as_deref()
            .map_or_else(Bytes::new, |body| Bytes::from(decode_request_body(body)))
    }
}

/// Stand-in origin for resolving paths before the real one is known
const PLACEHOLDER_ORIGIN: &str = "http://localhost/";

/// Path and query of the canonical request URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    /// Percent-encoded path, dot segments resolved, always starting with `/`
    pub path: String,
    /// Percent-encoded query string without the leading `?`
    pub query: String,
}

impl RequestUrl {
    /// Resolve a raw path and query the way a browser resolves a URL
    pub fn resolve(path: &str, query: &str) -> std::result::Result<Self, String> {
        let mut url = Url::parse(PLACEHOLDER_ORIGIN)
            .and_then(|origin| origin.join(path))
            .map_err(|e| e.to_string())?;
        if url.cannot_be_a_base() {
            return Err("not a hierarchical path".to_string());
        }
        url.set_query(Some(query).filter(|q| !q.is_empty()));
        Ok(Self {
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        })
    }

    /// `?query` when the query is non-empty, empty otherwise
    pub fn query_suffix(&self) -> String {
        if self.query.is_empty() {
            String::new()
        } else {
            format!("?{}", self.query)
        }
    }

    /// Absolute URL against a base origin
    ///
    /// Only the scheme and authority of `base` are used; the path always comes
    /// from the request.
    pub fn absolute(&self, base: &str) -> std::result::Result<Uri, String> {
        let base = Url::parse(base).map_err(|e| format!("invalid base URL '{base}': {e}"))?;
        if !base.has_host() {
            return Err(format!("base URL '{base}' has no host"));
        }
        let mut url = base
            .join(&self.path)
            .map_err(|e| format!("invalid request URL: {e}"))?;
        url.set_query(Some(self.query.as_str()).filter(|q| !q.is_empty()));
        url.as_str()
            .parse()
            .map_err(|e| format!("invalid request URL '{url}': {e}"))
    }
}

/// Outbound envelope: the only representation crossing back to the runtime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<ActionResponse> for EnvelopeResponse {
    fn from(res: ActionResponse) -> Self {
        let body = res
            .body
            .as_ref()
            .map(|bytes| TransportBody::encode(res.content_type(), bytes).into_string());

        let mut headers = HashMap::with_capacity(res.headers.keys_len());
        for name in res.headers.keys() {
            let mut values = res
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            // Cookies cannot be comma-joined; the last one wins
            let value = if name == header::SET_COOKIE {
                values.next_back().unwrap_or_default()
            } else {
                values.collect::<Vec<_>>().join(", ")
            };
            headers.insert(name.as_str().to_string(), value);
        }

        Self {
            status_code: res.status.as_u16(),
            headers,
            body,
        }
    }
}
