//! MedPulse server binary.

use anyhow::Context;
use clap::Parser;
use medpulse_server::config::ServerConfig;
use medpulse_server::metrics;
use medpulse_server::server::MedPulseServer;
use tracing_subscriber::EnvFilter;

/// Hospital real-time notification service.
#[derive(Parser, Debug)]
#[command(name = "medpulse-server", version)]
struct Args {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 = auto-assign).
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// HS256 secret used to verify handshake tokens.
    #[arg(long, env = "MEDPULSE_JWT_SECRET")]
    jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        jwt_secret: args.jwt_secret,
        ..ServerConfig::default()
    };

    let metrics_handle = metrics::install_recorder();
    let server = MedPulseServer::new(config, metrics_handle);
    let (addr, serve_handle) = server.listen().await.context("failed to bind listener")?;
    tracing::info!(%addr, "medpulse server started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutdown signal received");
    server.shutdown().graceful_shutdown(vec![serve_handle], None).await;

    Ok(())
}
