// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub bundle: BundleConfig,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// Action proxy listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Upper bound for serving one proxy connection, in seconds
    pub request_timeout: u64,
}

/// Layout of the deployed bundle
#[derive(Debug, Deserialize, Clone)]
pub struct BundleConfig {
    pub dir: String,
    pub client_dir: String,
    pub static_dir: String,
    pub prerendered_dir: String,
    /// Route manifest, relative to `dir`
    pub manifest: String,
}

/// Values baked in at build time; unset values come from the environment
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ActionConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub ip_header: Option<String>,
    /// Prefix of the runtime environment variables (`{prefix}BASE_URL`)
    #[serde(default)]
    pub env_prefix: String,
}

/// Upstream renderer; dynamic rendering is disabled when unset
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RendererConfig {
    #[serde(default)]
    pub upstream: Option<String>,
}

/// Runtime environment values read at process start
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RuntimeEnv {
    #[serde(default)]
    pub base_url: Option<String>,
    /// Only the literal `true` enables debug logging
    #[serde(default)]
    pub debug: Option<String>,
    #[serde(default)]
    pub ip_header: Option<String>,
}

/// Resolved per-process settings consumed by the handlers
#[derive(Debug, Clone)]
pub struct ActionSettings {
    /// Origin used to build absolute request URLs for the renderer
    pub base_url: Option<String>,
    /// Verbose per-invocation logging
    pub debug: bool,
    /// Lower-cased name of the header carrying the client address
    pub ip_header: String,
    /// Name of the base URL variable, used in diagnostics
    pub base_url_var: String,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            debug: false,
            ip_header: "x-forwarded-for".to_string(),
            base_url_var: "BASE_URL".to_string(),
        }
    }
}
