//! Dynamic render delegate
//!
//! Rebuilds an HTTP request from the envelope, hands it to the renderer and
//! buffers the rendered response.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};

use super::Resolver;
use crate::config::AppState;
use crate::envelope::{InvocationEnvelope, RequestUrl};
use crate::error::{RenderError, Result};
use crate::http::path::decode_path;
use crate::http::{self, ActionResponse};
use crate::logger;
use crate::render::RenderContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicRenderer;

#[async_trait]
impl Resolver for DynamicRenderer {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    async fn attempt(
        &self,
        state: &AppState,
        url: &RequestUrl,
        envelope: &InvocationEnvelope,
    ) -> Result<Option<ActionResponse>> {
        let Some(renderer) = state.renderer() else {
            return Ok(None);
        };

        // Checked here rather than at startup: static and prerendered
        // responses do not need an origin.
        let Some(base_url) = state.settings.base_url.as_deref() else {
            return Ok(Some(http::build_config_error_response(&format!(
                "{} is not defined",
                state.settings.base_url_var
            ))));
        };

        let routable = match decode_path(&url.path) {
            Some(path) => state.manifest.has_route(&path),
            None => state.manifest.route_count() == 0,
        };
        if !routable {
            return Ok(None);
        }

        let uri = match url.absolute(base_url) {
            Ok(uri) => uri,
            Err(e) => {
                logger::log_error(&e);
                return Ok(Some(http::build_config_error_response(&format!(
                    "{} is not a valid origin",
                    state.settings.base_url_var
                ))));
            }
        };

        let method = envelope.method()?;
        let body = if method == Method::GET || method == Method::HEAD {
            Bytes::new()
        } else {
            envelope.decoded_body()
        };
        let mut request = Request::new(Full::new(body));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = envelope.header_map();

        let ctx = RenderContext::new(envelope.header(&state.settings.ip_header).unwrap_or_default());

        // Renderer failures are not recovered here
        let response = renderer.respond(request, &ctx).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(RenderError)?.to_bytes();

        Ok(Some(ActionResponse {
            status: parts.status,
            headers: parts.headers,
            body: Some(body),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionSettings, AssetRoots};
    use crate::error::Error;
    use crate::manifest::{RouteDefinition, RouteManifest};
    use crate::render::{RenderBody, Renderer};
    use hyper::header::{self, HeaderValue};
    use hyper::{Response, StatusCode};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Records the request it receives and echoes a fixed page
    #[derive(Default)]
    struct RecordingRenderer {
        seen: Mutex<Option<(Method, String, Bytes, String)>>,
    }

    #[async_trait]
    impl Renderer for RecordingRenderer {
        async fn respond(
            &self,
            request: Request<Full<Bytes>>,
            ctx: &RenderContext,
        ) -> std::result::Result<Response<RenderBody>, RenderError> {
            let (parts, body) = request.into_parts();
            let body = body.collect().await.map_err(RenderError::new)?.to_bytes();
            *self.seen.lock().unwrap() = Some((
                parts.method,
                parts.uri.to_string(),
                body,
                ctx.client_address().to_string(),
            ));
            let mut response = Response::new(
                Full::new(Bytes::from_static(b"<h1>rendered</h1>"))
                    .map_err(|never| match never {})
                    .boxed(),
            );
            *response.status_mut() = StatusCode::CREATED;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html"),
            );
            Ok(response)
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl Renderer for FailingRenderer {
        async fn respond(
            &self,
            _request: Request<Full<Bytes>>,
            _ctx: &RenderContext,
        ) -> std::result::Result<Response<RenderBody>, RenderError> {
            Err(RenderError::new("template exploded"))
        }
    }

    fn state(
        base_url: Option<&str>,
        routes: &[&str],
        renderer: Option<Arc<dyn Renderer>>,
    ) -> AppState {
        let settings = ActionSettings {
            base_url: base_url.map(String::from),
            ..Default::default()
        };
        let routes: Vec<RouteDefinition> = routes
            .iter()
            .map(|id| RouteDefinition { id: (*id).to_string() })
            .collect();
        let manifest = RouteManifest::new("_app".into(), String::new(), HashSet::new(), &routes);
        let roots = AssetRoots {
            client: "client".into(),
            static_files: "static".into(),
            prerendered: "prerendered".into(),
        };
        AppState::new(settings, manifest, roots, renderer)
    }

    fn envelope(method: &str, path: &str) -> InvocationEnvelope {
        InvocationEnvelope {
            method: method.to_string(),
            path: path.to_string(),
            query: "q=1".to_string(),
            body: Some("aGVsbG8=".to_string()),
            headers: [("x-forwarded-for".to_string(), "203.0.113.9".to_string())]
                .into_iter()
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_renders_request() {
        let renderer = Arc::new(RecordingRenderer::default());
        let state = state(Some("https://example.com"), &[], Some(renderer.clone()));
        let env = envelope("post", "/submit");

        let res = DynamicRenderer
            .attempt(&state, &env.request_url().unwrap(), &env)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.content_type(), Some("text/html"));
        assert_eq!(res.body.as_deref(), Some(&b"<h1>rendered</h1>"[..]));

        let (method, uri, body, client) = renderer.seen.lock().unwrap().take().unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(uri, "https://example.com/submit?q=1");
        assert_eq!(body, Bytes::from_static(b"hello"));
        assert_eq!(client, "203.0.113.9");
    }

    #[tokio::test]
    async fn test_get_requests_carry_no_body() {
        let renderer = Arc::new(RecordingRenderer::default());
        let state = state(Some("https://example.com"), &[], Some(renderer.clone()));
        let env = envelope("GET", "/");
        DynamicRenderer
            .attempt(&state, &env.request_url().unwrap(), &env)
            .await
            .unwrap();
        let (_, _, body, _) = renderer.seen.lock().unwrap().take().unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_base_url() {
        let state = state(None, &[], Some(Arc::new(RecordingRenderer::default())));
        let env = envelope("GET", "/anything");
        let res = DynamicRenderer
            .attempt(&state, &env.request_url().unwrap(), &env)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.content_type(), Some("text/plain"));
        let body = String::from_utf8(res.body.unwrap().to_vec()).unwrap();
        assert!(body.contains("is not defined"));
    }

    #[tokio::test]
    async fn test_invalid_base_url() {
        let state = state(Some("example.com"), &[], Some(Arc::new(RecordingRenderer::default())));
        let env = envelope("GET", "/");
        let res = DynamicRenderer
            .attempt(&state, &env.request_url().unwrap(), &env)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(res.body.unwrap().to_vec()).unwrap();
        assert_eq!(body, "BASE_URL is not a valid origin");
    }

    #[tokio::test]
    async fn test_disabled_or_unrouted_does_not_match() {
        let disabled = state(Some("https://example.com"), &[], None);
        let env = envelope("GET", "/blog/a");
        assert!(DynamicRenderer
            .attempt(&disabled, &env.request_url().unwrap(), &env)
            .await
            .unwrap()
            .is_none());

        let routed = state(
            Some("https://example.com"),
            &["/about"],
            Some(Arc::new(RecordingRenderer::default())),
        );
        assert!(DynamicRenderer
            .attempt(&routed, &env.request_url().unwrap(), &env)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_renderer_failure_propagates() {
        let state = state(Some("https://example.com"), &[], Some(Arc::new(FailingRenderer)));
        let env = envelope("GET", "/");
        let err = DynamicRenderer
            .attempt(&state, &env.request_url().unwrap(), &env)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
        assert!(err.to_string().contains("template exploded"));
    }
}
