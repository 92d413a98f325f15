use anyhow::{Context, Result};
use clap::Parser;
use contentlens::{analysis::AnalysisService, api, config::Config, logging};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 8000;

/// Summarize text and surface related sources over HTTP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file (defaults to `CONTENTLENS_CONFIG`, then `config.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Port to listen on; overrides `SERVER_PORT`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.port.is_some() {
        config.server_port = cli.port;
    }
    logging::init_tracing(&config.log_level);
    tracing::info!(
        model = %config.openai_model,
        max_tokens = config.max_tokens,
        search_result_count = config.search_result_count,
        search_retry_limit = config.search_retry_limit,
        "Configuration loaded"
    );

    let service =
        AnalysisService::from_config(&config).context("failed to build outbound HTTP clients")?;
    let app = api::create_router(Arc::new(service));

    let addr = listen_addr(config.server_port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;
    tracing::info!("Server stopped");
    Ok(())
}

fn listen_addr(port: Option<u16>) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port.unwrap_or(DEFAULT_PORT)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
