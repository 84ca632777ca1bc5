// Application state module
// Process-wide context built once at startup and shared by every invocation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::types::{ActionSettings, BundleConfig, Config, RuntimeEnv};
use crate::error::{RenderError, Result};
use crate::manifest::RouteManifest;
use crate::render::{HttpRenderer, Renderer};

/// The three asset roots of the deployed bundle
#[derive(Debug, Clone)]
pub struct AssetRoots {
    /// Build output, including the immutable subdirectory
    pub client: PathBuf,
    /// User-provided public files
    pub static_files: PathBuf,
    /// HTML generated at build time
    pub prerendered: PathBuf,
}

impl AssetRoots {
    pub fn from_bundle(bundle: &BundleConfig) -> Self {
        let dir = PathBuf::from(&bundle.dir);
        Self {
            client: dir.join(&bundle.client_dir),
            static_files: dir.join(&bundle.static_dir),
            prerendered: dir.join(&bundle.prerendered_dir),
        }
    }
}

/// Application state
///
/// Immutable after construction apart from the one-shot renderer init guard.
pub struct AppState {
    pub settings: ActionSettings,
    pub manifest: RouteManifest,
    pub roots: AssetRoots,
    renderer: Option<Arc<dyn Renderer>>,
    renderer_env: HashMap<String, String>,
    renderer_ready: OnceCell<()>,
}

impl AppState {
    pub fn new(
        settings: ActionSettings,
        manifest: RouteManifest,
        roots: AssetRoots,
        renderer: Option<Arc<dyn Renderer>>,
    ) -> Self {
        Self {
            settings,
            manifest,
            roots,
            renderer,
            renderer_env: HashMap::new(),
            renderer_ready: OnceCell::new(),
        }
    }

    /// Build the state from configuration: loads the manifest, reads the
    /// runtime environment and connects the upstream renderer if configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let env = RuntimeEnv::from_env(&config.action.env_prefix)?;
        let settings = config.action_settings(env);
        let manifest = RouteManifest::load(&config.manifest_path())?;
        let renderer = match config.renderer.upstream.as_deref() {
            Some(upstream) => Some(Arc::new(HttpRenderer::new(upstream)?) as Arc<dyn Renderer>),
            None => None,
        };

        Ok(Self::new(
            settings,
            manifest,
            AssetRoots::from_bundle(&config.bundle),
            renderer,
        )
        .with_renderer_env(std::env::vars().collect()))
    }

    /// Environment handed to the renderer's one-time init
    #[must_use]
    pub fn with_renderer_env(mut self, env: HashMap<String, String>) -> Self {
        self.renderer_env = env;
        self
    }

    pub fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    /// Run the renderer's init exactly once per process
    ///
    /// Concurrent first callers wait on the same initialization; a failed init
    /// is retried by the next caller.
    pub async fn ensure_renderer_ready(&self) -> Result<(), RenderError> {
        let Some(renderer) = &self.renderer else {
            return Ok(());
        };
        self.renderer_ready
            .get_or_try_init(|| async {
                renderer.init(&self.renderer_env).await?;
                tracing::debug!("Renderer initialized");
                Ok::<(), RenderError>(())
            })
            .await?;
        Ok(())
    }
}
