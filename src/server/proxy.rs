//! Action proxy protocol
//!
//! `POST /init` acknowledges initialization, `POST /run` carries one
//! invocation envelope under `value` and answers with the envelope response.

use std::convert::Infallible;
use std::time::Instant;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::envelope::InvocationEnvelope;
use crate::handler::Dispatcher;
use crate::logger::{self, AccessLogEntry};

/// Body of a `/run` call
#[derive(Debug, Deserialize)]
struct RunPayload {
    #[serde(default)]
    value: InvocationEnvelope,
    #[serde(default)]
    activation_id: Option<String>,
}

/// Access log settings for the proxy; `None` disables access logging
#[derive(Debug, Clone, Default)]
pub struct ProxyOptions {
    pub access_log_format: Option<String>,
}

/// Serve one proxy request
pub async fn handle<B>(
    req: Request<B>,
    dispatcher: &Dispatcher,
    options: &ProxyOptions,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    let is_run = match req.uri().path() {
        "/init" => false,
        "/run" => true,
        _ => return Ok(json_response(StatusCode::NOT_FOUND, &json!({"error": "Not Found"}))),
    };
    if req.method() != Method::POST {
        let mut response = json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &json!({"error": "Method Not Allowed"}),
        );
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("POST"));
        return Ok(response);
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read proxy request body: {e}"));
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({"error": "Unreadable request body"}),
            ));
        }
    };

    if !is_run {
        tracing::debug!("Action initialized");
        return Ok(json_response(StatusCode::OK, &json!({"ok": true})));
    }

    let payload: RunPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            logger::log_warning(&format!("Rejected /run payload: {e}"));
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({"error": format!("Invalid run payload: {e}")}),
            ));
        }
    };

    Ok(run(payload, dispatcher, options).await)
}

async fn run(
    payload: RunPayload,
    dispatcher: &Dispatcher,
    options: &ProxyOptions,
) -> Response<Full<Bytes>> {
    let start = Instant::now();
    let RunPayload {
        value: envelope,
        activation_id,
    } = payload;

    match dispatcher.invoke(&envelope).await {
        Ok(result) => {
            if let Some(format) = &options.access_log_format {
                let mut entry = AccessLogEntry::from_invocation(
                    &envelope,
                    &dispatcher.state().settings.ip_header,
                );
                entry.activation_id.clone_from(&activation_id);
                entry.complete(&result, start.elapsed());
                logger::log_access(&entry, format);
            }
            match serde_json::to_value(&result) {
                Ok(value) => json_response(StatusCode::OK, &value),
                Err(e) => failure(activation_id.as_deref(), &e),
            }
        }
        Err(e) => failure(activation_id.as_deref(), &e),
    }
}

fn failure(activation_id: Option<&str>, err: &impl std::fmt::Display) -> Response<Full<Bytes>> {
    logger::log_invocation_failed(activation_id, err);
    json_response(StatusCode::BAD_GATEWAY, &json!({"error": err.to_string()}))
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionSettings, AppState, AssetRoots};
    use crate::error::RenderError;
    use crate::manifest::RouteManifest;
    use crate::render::{RenderBody, RenderContext, Renderer};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct BrokenRenderer;

    #[async_trait]
    impl Renderer for BrokenRenderer {
        async fn respond(
            &self,
            _request: Request<Full<Bytes>>,
            _ctx: &RenderContext,
        ) -> std::result::Result<Response<RenderBody>, RenderError> {
            Err(RenderError::new("upstream unavailable"))
        }
    }

    fn dispatcher(renderer: Option<Arc<dyn Renderer>>) -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/robots.txt"), "User-agent: *\n").unwrap();
        let settings = ActionSettings {
            base_url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let manifest = RouteManifest::new("_app".into(), String::new(), HashSet::new(), &[]);
        let roots = AssetRoots {
            client: dir.path().join("client"),
            static_files: dir.path().join("static"),
            prerendered: dir.path().join("prerendered"),
        };
        let state = AppState::new(settings, manifest, roots, renderer);
        (dir, Dispatcher::new(Arc::new(state)))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn call(
        dispatcher: &Dispatcher,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, serde_json::Value) {
        let options = ProxyOptions {
            access_log_format: Some("combined".to_string()),
        };
        let res = handle(req, dispatcher, &options).await.unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_init() {
        let (_dir, dispatcher) = dispatcher(None);
        let (status, body) = call(&dispatcher, request(Method::POST, "/init", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_run_serves_static_file() {
        let (_dir, dispatcher) = dispatcher(None);
        let payload = json!({
            "value": {"__ow_method": "get", "__ow_path": "/robots.txt", "__ow_headers": {}},
            "activation_id": "abc123"
        });
        let (status, body) =
            call(&dispatcher, request(Method::POST, "/run", &payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["body"], "User-agent: *\n");
        assert_eq!(body["headers"]["content-type"], "text/plain");
        assert_eq!(body["headers"]["cache-control"], "public, max-age=3600");
    }

    #[tokio::test]
    async fn test_run_unmatched_is_404_envelope() {
        let (_dir, dispatcher) = dispatcher(None);
        let payload = json!({"value": {"__ow_path": "/missing"}});
        let (status, body) =
            call(&dispatcher, request(Method::POST, "/run", &payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_run_failure_is_502() {
        let (_dir, dispatcher) = dispatcher(Some(Arc::new(BrokenRenderer)));
        let payload = json!({"value": {"__ow_path": "/page"}});
        let (status, body) =
            call(&dispatcher, request(Method::POST, "/run", &payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_invalid_payload() {
        let (_dir, dispatcher) = dispatcher(None);
        let (status, body) = call(&dispatcher, request(Method::POST, "/run", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let (_dir, dispatcher) = dispatcher(None);
        let (status, _) = call(&dispatcher, request(Method::POST, "/other", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let options = ProxyOptions::default();
        let res = handle(request(Method::GET, "/run", ""), &dispatcher, &options)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "POST");
    }
}
