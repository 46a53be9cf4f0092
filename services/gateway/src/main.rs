use anyhow::Context;
use ledger_core::{Config, Ledger, Metrics};
use ledger_gateway::{router, AppState};
use tokio::net::TcpListener;
use tracing::info;

fn load_config() -> anyhow::Result<Config> {
    let config = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("cannot load config from {}", path))?
            .with_env_overrides()?,
        Err(_) => Config::from_env()?,
    };
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    let config = load_config()?;
    info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting ledger gateway"
    );

    let ledger = Ledger::open(&config)?.with_metrics(Metrics::new()?);
    let app = router(AppState::new(ledger, &config));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}
