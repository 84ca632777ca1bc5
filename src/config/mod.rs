// Configuration module entry point
// Loads the file/environment configuration and resolves the action settings

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

// Re-export public types
pub use state::{AppState, AssetRoots};
pub use types::{
    ActionConfig, ActionSettings, BundleConfig, Config, LoggingConfig, PerformanceConfig,
    RendererConfig, RuntimeEnv, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "whisk.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("WHISK").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.request_timeout", 60)?
            .set_default("bundle.dir", ".")?
            .set_default("bundle.client_dir", "client")?
            .set_default("bundle.static_dir", "static")?
            .set_default("bundle.prerendered_dir", "prerendered")?
            .set_default("bundle.manifest", "server/manifest.json")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("whisk")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.bundle.dir).join(&self.bundle.manifest)
    }

    /// Merge build-time action values with the runtime environment
    pub fn action_settings(&self, env: RuntimeEnv) -> ActionSettings {
        let action = &self.action;
        ActionSettings {
            base_url: action
                .base_url
                .clone()
                .or(env.base_url)
                .filter(|url| !url.is_empty()),
            debug: action
                .debug
                .unwrap_or_else(|| env.debug.as_deref() == Some("true")),
            ip_header: action
                .ip_header
                .clone()
                .or(env.ip_header)
                .unwrap_or_else(|| "x-forwarded-for".to_string())
                .to_ascii_lowercase(),
            base_url_var: format!("{}BASE_URL", action.env_prefix),
        }
    }
}

impl RuntimeEnv {
    /// Read `{prefix}BASE_URL`, `{prefix}DEBUG` and `{prefix}IP_HEADER` from the process environment
    pub fn from_env(prefix: &str) -> Result<Self, config::ConfigError> {
        Self::from_source(prefix, None)
    }

    /// Same as [`RuntimeEnv::from_env`], reading from an explicit variable map
    pub fn from_source(
        prefix: &str,
        source: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let environment = if prefix.is_empty() {
            config::Environment::default()
        } else {
            config::Environment::with_prefix(prefix).prefix_separator("")
        };
        config::Config::builder()
            .add_source(environment.source(source))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::load_from("/nonexistent/whisk-test-config").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.bundle.client_dir, "client");
        assert_eq!(cfg.manifest_path(), PathBuf::from("./server/manifest.json"));
        assert!(cfg.renderer.upstream.is_none());
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_runtime_env_with_prefix() {
        let env = RuntimeEnv::from_source(
            "PUBLIC_",
            Some(vars(&[
                ("PUBLIC_BASE_URL", "https://example.com"),
                ("PUBLIC_DEBUG", "true"),
                ("BASE_URL", "https://ignored.example"),
            ])),
        )
        .unwrap();
        assert_eq!(env.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(env.debug.as_deref(), Some("true"));
        assert!(env.ip_header.is_none());
    }

    #[test]
    fn test_action_settings_merge() {
        let mut cfg = Config::load_from("/nonexistent/whisk-test-config").unwrap();
        cfg.action.env_prefix = "APP_".to_string();

        let settings = cfg.action_settings(RuntimeEnv {
            base_url: Some("https://env.example".to_string()),
            debug: Some("1".to_string()),
            ip_header: Some("CF-Connecting-IP".to_string()),
        });
        assert_eq!(settings.base_url.as_deref(), Some("https://env.example"));
        assert!(!settings.debug);
        assert_eq!(settings.ip_header, "cf-connecting-ip");
        assert_eq!(settings.base_url_var, "APP_BASE_URL");

        cfg.action.base_url = Some("https://baked.example".to_string());
        cfg.action.debug = Some(true);
        let settings = cfg.action_settings(RuntimeEnv::default());
        assert_eq!(settings.base_url.as_deref(), Some("https://baked.example"));
        assert!(settings.debug);
        assert_eq!(settings.ip_header, "x-forwarded-for");
    }

    #[test]
    fn test_empty_base_url_is_unset() {
        let cfg = Config::load_from("/nonexistent/whisk-test-config").unwrap();
        let settings = cfg.action_settings(RuntimeEnv {
            base_url: Some(String::new()),
            ..Default::default()
        });
        assert!(settings.base_url.is_none());
    }
}
