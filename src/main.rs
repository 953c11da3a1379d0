use std::sync::Arc;

mod config;
mod handler;
mod http;
mod limiter;
mod logger;
mod math;
mod server;
mod upstream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Single-threaded: connection tasks run on a LocalSet
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg)?);

    logger::log_server_start(&listener.local_addr()?, &cfg);
    if cfg.bfhl.official_email().is_none() {
        logger::log_warning("OFFICIAL_EMAIL is not set; /bfhl will answer 500 MISSING_ENV");
    }
    if cfg.upstream.api_key().is_none() {
        logger::log_warning("OPENAI_API_KEY is not set; AI requests will answer 500 MISSING_ENV");
    }

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, signals))
        .await
}
