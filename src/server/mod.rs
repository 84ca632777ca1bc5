// Server module entry
// Hosts the dispatcher behind the action proxy protocol

pub mod connection;
pub mod listener;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::handler::Dispatcher;
use crate::logger;

pub use connection::ConnectionContext;
pub use listener::create_reusable_listener;
pub use proxy::ProxyOptions;

/// Accept connections until Ctrl+C or SIGTERM
///
/// # Errors
///
/// Fails only if the shutdown signal handler cannot be installed.
pub async fn run(
    listener: TcpListener,
    dispatcher: Dispatcher,
    config: &Config,
) -> std::io::Result<()> {
    let ctx = Arc::new(ConnectionContext {
        dispatcher,
        options: ProxyOptions {
            access_log_format: config
                .logging
                .access_log
                .then(|| config.logging.access_log_format.clone()),
        },
        timeout: Duration::from_secs(config.performance.request_timeout),
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(stream, peer_addr, Arc::clone(&ctx));
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("Shutdown signal received, stopping listener");
                return Ok(());
            }
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
