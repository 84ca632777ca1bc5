//! Static file serving module
//!
//! Resolves a URL path to a file under an asset root and builds the response
//! with `ETag`, `Last-Modified` and `Cache-Control`.

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use super::Resolver;
use crate::config::AppState;
use crate::envelope::{InvocationEnvelope, RequestUrl};
use crate::error::{Error, Result};
use crate::http::cache::{self, CachePolicy};
use crate::http::path::{decode_path, to_relative_path};
use crate::http::{self, mime, ActionResponse};
use crate::logger;

/// Which asset root a resolver serves from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRoot {
    Client,
    Static,
}

/// Serves files from the client or static root
#[derive(Debug, Clone, Copy)]
pub struct StaticAssetResolver {
    root: AssetRoot,
    immutable: bool,
}

impl StaticAssetResolver {
    /// Build output; content-hashed files are cached permanently
    pub const fn client() -> Self {
        Self {
            root: AssetRoot::Client,
            immutable: true,
        }
    }

    /// User-provided public files
    pub const fn public() -> Self {
        Self {
            root: AssetRoot::Static,
            immutable: false,
        }
    }
}

#[async_trait]
impl Resolver for StaticAssetResolver {
    fn name(&self) -> &'static str {
        match self.root {
            AssetRoot::Client => "static-client",
            AssetRoot::Static => "static-public",
        }
    }

    async fn attempt(
        &self,
        state: &AppState,
        url: &RequestUrl,
        envelope: &InvocationEnvelope,
    ) -> Result<Option<ActionResponse>> {
        let root = match self.root {
            AssetRoot::Client => &state.roots.client,
            AssetRoot::Static => &state.roots.static_files,
        };
        let immutable_prefix = self.immutable.then(|| state.manifest.immutable_prefix());
        serve_asset(
            root,
            &url.path,
            envelope.header("if-none-match"),
            immutable_prefix.as_deref(),
        )
        .await
    }
}

/// Serve a file addressed by a raw (percent-encoded) URL path
///
/// `immutable_prefix` is `Some` only for roots whose hashed assets may be
/// cached permanently.
pub async fn serve_asset(
    root: &Path,
    url_path: &str,
    if_none_match: Option<&str>,
    immutable_prefix: Option<&str>,
) -> Result<Option<ActionResponse>> {
    let Some(decoded) = decode_path(url_path) else {
        return Ok(None);
    };
    serve_decoded(root, &decoded, if_none_match, immutable_prefix).await
}

/// Serve a file addressed by an already decoded path
pub async fn serve_decoded(
    root: &Path,
    decoded: &str,
    if_none_match: Option<&str>,
    immutable_prefix: Option<&str>,
) -> Result<Option<ActionResponse>> {
    let Some(relative) = to_relative_path(decoded) else {
        logger::log_warning(&format!("Path traversal attempt blocked: {decoded}"));
        return Ok(None);
    };
    let file_path = root.join(relative);

    let metadata = match fs::metadata(&file_path).await {
        Ok(m) => m,
        // Missing files are the common case, not worth logging
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(None)
        }
        Err(source) => {
            return Err(Error::Asset {
                path: file_path,
                source,
            })
        }
    };
    if metadata.is_dir() {
        return Ok(None);
    }
    if !is_within_root(root, &file_path).await {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {decoded} -> {}",
            file_path.display()
        ));
        return Ok(None);
    }

    let content = fs::read(&file_path).await.map_err(|source| Error::Asset {
        path: file_path.clone(),
        source,
    })?;

    let mut headers = HeaderMap::new();
    insert_header(&mut headers, header::CONTENT_TYPE, mime::get_content_type(decoded));
    if let Ok(modified) = metadata.modified() {
        insert_header(&mut headers, header::LAST_MODIFIED, cache::format_http_date(modified));
    }
    let etag = cache::generate_etag(&content);
    insert_header(&mut headers, header::ETAG, etag.clone());

    // Check if client has cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return Ok(Some(http::build_304_response(headers)));
    }

    let policy = immutable_prefix.map_or_else(CachePolicy::default, |prefix| {
        CachePolicy::for_asset(decoded, true, prefix)
    });
    insert_header(&mut headers, header::CACHE_CONTROL, policy.to_header_value());

    Ok(Some(ActionResponse {
        status: StatusCode::OK,
        headers,
        body: Some(Bytes::from(content)),
    }))
}

/// Security: ensure a resolved file does not escape its root through symlinks
async fn is_within_root(root: &Path, file_path: &Path) -> bool {
    match (fs::canonicalize(root).await, fs::canonicalize(file_path).await) {
        (Ok(root), Ok(file)) => file.starts_with(root),
        _ => false,
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: String) {
    match HeaderValue::try_from(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => logger::log_error(&format!("Invalid {name} header value: {e}")),
    }
}
