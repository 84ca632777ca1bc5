//! Prerendered page module
//!
//! Serves pages generated at build time and canonicalizes trailing slashes.

use async_trait::async_trait;

use super::static_files::serve_decoded;
use super::Resolver;
use crate::config::AppState;
use crate::envelope::{InvocationEnvelope, RequestUrl};
use crate::error::Result;
use crate::http::path::decode_path;
use crate::http::{self, ActionResponse};

#[derive(Debug, Clone, Copy, Default)]
pub struct PrerenderedResolver;

#[async_trait]
impl Resolver for PrerenderedResolver {
    fn name(&self) -> &'static str {
        "prerendered"
    }

    async fn attempt(
        &self,
        state: &AppState,
        url: &RequestUrl,
        envelope: &InvocationEnvelope,
    ) -> Result<Option<ActionResponse>> {
        let Some(path) = decode_path(&url.path) else {
            return Ok(None);
        };

        if state.manifest.is_prerendered(&path) {
            let if_none_match = envelope.header("if-none-match");
            for candidate in page_files(&path) {
                let served =
                    serve_decoded(&state.roots.prerendered, &candidate, if_none_match, None).await?;
                if served.is_some() {
                    return Ok(served);
                }
            }
            return Ok(None);
        }

        // Redirect without touching the filesystem
        if let Some(stripped) = path.strip_suffix('/') {
            if state.manifest.is_prerendered(stripped) {
                let target = format!("{stripped}{}", url.query_suffix());
                return Ok(http::build_permanent_redirect(&target));
            }
        }

        Ok(None)
    }
}

/// Files that may hold the page for a prerendered path, in lookup order
fn page_files(path: &str) -> Vec<String> {
    if path.ends_with('/') {
        return vec![format!("{path}index.html")];
    }
    vec![
        path.to_string(),
        format!("{path}.html"),
        format!("{path}/index.html"),
    ]
}
