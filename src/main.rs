use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use query_router::RouterService;
use query_router::config::Config;
use query_router::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    // Missing credentials stop the process before anything is served
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Startup aborted: {}", e);
            return Err(e.into());
        }
    };

    let bind = config.bind_addr()?;
    let service = Arc::new(RouterService::new(&config)?);

    server::serve(service, bind).await?;
    Ok(())
}
