use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use lantern_relay::{SignalRelay, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lantern-relay")]
#[command(about = "Rendezvous relay for lantern peer sessions")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Listening port for the signaling endpoint.
    #[arg(short, long, default_value_t = 3001)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host/port")?;

    let relay = SignalRelay::new();
    let app = router(relay);

    println!(
        "{}",
        format!("📡 lantern relay listening on ws://{addr}/ws/{{peer_id}}")
            .green()
            .bold()
    );
    info!(%addr, "starting signaling relay");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
