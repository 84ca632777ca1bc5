//! HTTP cache control module
//!
//! Provides `ETag` generation, `Last-Modified` formatting and conditional request handling.

use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};
use std::time::SystemTime;

/// Generate `ETag` from the SHA-1 digest of the content
///
/// # Returns
/// Lowercase hex digest, unquoted, e.g. `2aae6c35c94fcfb415dbe95f408b9ce91ee846ed`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Format a modification time as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Strong comparison against a single validator: no list parsing, no `W/`
/// handling, no wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| client_etag == etag)
}

/// Cache control policy for served assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Content-hashed asset, cached for a year
    Immutable,
    /// Public cache with specified max-age (seconds)
    Public(u32),
}

impl CachePolicy {
    /// Pick the policy for an asset path
    ///
    /// Only resolvers that opt in (`immutable`) may return `Immutable`, and only
    /// for paths under the manifest's immutable prefix.
    pub fn for_asset(path: &str, immutable: bool, immutable_prefix: &str) -> Self {
        if immutable && path.starts_with(immutable_prefix) {
            Self::Immutable
        } else {
            Self::default()
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Immutable => "public, max-age=31536000, immutable".to_string(),
            Self::Public(max_age) => format!("public, max-age={max_age}"),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(3600) // 1 hour
    }
}
