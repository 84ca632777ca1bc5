//! Renderer seam
//!
//! The dynamic renderer is an external collaborator. Anything implementing
//! [`Renderer`] can sit behind the dynamic handler; [`HttpRenderer`] forwards
//! to an upstream HTTP server.

mod upstream;

pub use upstream::HttpRenderer;

use async_trait::async_trait;
use http_body_util::combinators::BoxBody;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::collections::HashMap;

use crate::error::{BoxError, RenderError};

/// Response body produced by a renderer; may be streamed
pub type RenderBody = BoxBody<Bytes, BoxError>;

/// Per-request information supplied alongside the request
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    client_address: String,
}

impl RenderContext {
    pub fn new(client_address: impl Into<String>) -> Self {
        Self {
            client_address: client_address.into(),
        }
    }

    /// Client address read from the forwarded-for header, empty when absent
    pub fn client_address(&self) -> &str {
        &self.client_address
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// One-time setup with the process environment
    ///
    /// Called at most once per process; implementations must still tolerate
    /// repeated calls.
    async fn init(&self, _env: &HashMap<String, String>) -> Result<(), RenderError> {
        Ok(())
    }

    /// Render a request
    async fn respond(
        &self,
        request: Request<Full<Bytes>>,
        ctx: &RenderContext,
    ) -> Result<Response<RenderBody>, RenderError>;
}
