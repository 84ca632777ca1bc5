//! Upstream HTTP renderer
//!
//! Forwards the reconstructed request to a renderer process listening on a
//! configured origin (for example a framework server on localhost) and streams
//! its response back.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::collections::HashMap;

use super::{RenderBody, RenderContext, Renderer};
use crate::error::{BoxError, RenderError};

pub struct HttpRenderer {
    upstream: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpRenderer {
    /// Create a renderer for an `http://host:port` origin
    pub fn new(upstream: &str) -> Result<Self, RenderError> {
        let upstream: Uri = upstream.parse().map_err(RenderError::new)?;
        if upstream.scheme_str() != Some("http") || upstream.authority().is_none() {
            return Err(RenderError::new(format!(
                "renderer upstream must be an http:// origin, got '{upstream}'"
            )));
        }
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { upstream, client })
    }

    /// Point the request at the upstream origin, keeping path and query
    fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, RenderError> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let mut parts = self.upstream.clone().into_parts();
        parts.path_and_query = Some(path_and_query.parse().map_err(RenderError::new)?);
        Uri::from_parts(parts).map_err(RenderError::new)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn init(&self, _env: &HashMap<String, String>) -> Result<(), RenderError> {
        tracing::info!("Dynamic rendering forwarded to {}", self.upstream);
        Ok(())
    }

    async fn respond(
        &self,
        request: Request<Full<Bytes>>,
        ctx: &RenderContext,
    ) -> Result<Response<RenderBody>, RenderError> {
        let (mut parts, body) = request.into_parts();

        // The public host travels as x-forwarded-host; the client sets Host
        if let Some(host) = parts.uri.authority().map(|a| a.as_str().to_string()) {
            if let Ok(value) = HeaderValue::from_str(&host) {
                parts.headers.insert("x-forwarded-host", value);
            }
        }
        if !ctx.client_address().is_empty() && !parts.headers.contains_key("x-forwarded-for") {
            if let Ok(value) = HeaderValue::from_str(ctx.client_address()) {
                parts.headers.insert("x-forwarded-for", value);
            }
        }
        parts.headers.remove(header::HOST);
        parts.headers.remove(header::CONTENT_LENGTH);
        parts.uri = self.rewrite_uri(&parts.uri)?;

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(RenderError::new)?;
        Ok(response.map(|body| body.map_err(|e| -> BoxError { Box::new(e) }).boxed()))
    }
}
