//! Request dispatch module
//!
//! Entry point for invocation processing: builds the canonical URL, walks the
//! handler chain in priority order and encodes the winning response for the
//! envelope.

use std::sync::Arc;

use super::{DynamicRenderer, PrerenderedResolver, Resolver, StaticAssetResolver};
use crate::config::AppState;
use crate::envelope::{EnvelopeResponse, InvocationEnvelope};
use crate::error::Result;
use crate::http::{self, ActionResponse};

/// Owns the process-wide state and the ordered handler chain
pub struct Dispatcher {
    state: Arc<AppState>,
    chain: Vec<Box<dyn Resolver>>,
}

impl Dispatcher {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            chain: default_chain(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Names of the handlers, in evaluation order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|h| h.name()).collect()
    }

    /// Handle one invocation and produce the outbound envelope
    ///
    /// An `Err` is an invocation failure for the hosting runtime.
    pub async fn invoke(&self, envelope: &InvocationEnvelope) -> Result<EnvelopeResponse> {
        self.dispatch(envelope).await.map(EnvelopeResponse::from)
    }

    /// Handle one invocation, returning the pre-transport response
    pub async fn dispatch(&self, envelope: &InvocationEnvelope) -> Result<ActionResponse> {
        self.state.ensure_renderer_ready().await?;

        let url = envelope.request_url()?;
        if self.state.settings.debug {
            tracing::info!(?envelope, "Invocation received");
            tracing::info!(path = %url.path, query = %url.query, "Resolved request URL");
        }

        for handler in &self.chain {
            if let Some(response) = handler.attempt(&self.state, &url, envelope).await? {
                tracing::debug!(
                    handler = handler.name(),
                    status = response.status.as_u16(),
                    bytes = response.body_len(),
                    "Request handled"
                );
                return Ok(response);
            }
        }

        tracing::debug!(path = %url.path, "No handler matched");
        Ok(http::build_404_response())
    }
}

/// Static client assets win over public files, which win over prerendered
/// pages; dynamic rendering is the last resort
fn default_chain() -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(StaticAssetResolver::client()),
        Box::new(StaticAssetResolver::public()),
        Box::new(PrerenderedResolver),
        Box::new(DynamicRenderer),
    ]
}
