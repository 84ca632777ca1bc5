// Connection handling module
// Serves a single accepted TCP connection with the proxy protocol

use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use super::proxy::{self, ProxyOptions};
use crate::handler::Dispatcher;
use crate::logger;

/// Shared by every connection task
pub struct ConnectionContext {
    pub dispatcher: Dispatcher,
    pub options: ProxyOptions,
    /// Upper bound for serving one connection
    pub timeout: Duration,
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Serves HTTP/1.1 with keep-alive and the proxy service
/// 3. Applies the configured timeout to the whole connection
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    ctx: Arc<ConnectionContext>,
) {
    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout = ctx.timeout;

        let conn = http1::Builder::new().keep_alive(true).serve_connection(
            io,
            service_fn(move |req| {
                let ctx = Arc::clone(&ctx);
                async move { proxy::handle(req, &ctx.dispatcher, &ctx.options).await }
            }),
        );

        match tokio::time::timeout(timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout.as_secs()
                ));
            }
        }
    });
}
