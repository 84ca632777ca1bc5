//! Logger module
//!
//! Provides logging utilities for the action runtime including:
//! - Subscriber setup from configuration
//! - Process lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//!
//! Everything is emitted as `tracing` events.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::handler::Dispatcher;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `logging.level`. Should be called once at startup.
pub fn init(config: &Config) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| format!("Invalid log level '{}': {e}", config.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("Logger already initialized: {e}"))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, dispatcher: &Dispatcher) {
    let state = dispatcher.state();
    tracing::info!("======================================");
    tracing::info!("Action runtime started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("Bundle directory: {}", config.bundle.dir);
    tracing::info!(
        "Manifest: {} prerendered pages, {} server routes",
        state.manifest.prerendered_count(),
        state.manifest.route_count()
    );
    tracing::info!("Handler chain: {}", dispatcher.handler_names().join(" -> "));
    match &config.renderer.upstream {
        Some(upstream) => tracing::info!("Renderer upstream: {upstream}"),
        None => tracing::info!("Dynamic rendering disabled"),
    }
    if state.settings.base_url.is_none() {
        log_warning(&format!(
            "{} is not set; dynamic rendering will answer 500",
            state.settings.base_url_var
        ));
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_invocation_failed(activation_id: Option<&str>, err: &impl std::fmt::Display) {
    tracing::error!(
        activation_id = activation_id.unwrap_or("-"),
        "Invocation failed: {err}"
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
