use std::sync::Arc;

use whisk_serve::config::{AppState, Config};
use whisk_serve::handler::Dispatcher;
use whisk_serve::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg)?;

    // Size the runtime from the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::from_config(&cfg)?);
    let dispatcher = Dispatcher::new(state);

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg, &dispatcher);

    server::run(listener, dispatcher, &cfg).await?;
    Ok(())
}
