//! Conversion queue server binary
//!
//! Run with: cargo run --bin mineru-queue-server [config.toml]

use std::path::PathBuf;

use mineru_queue::{config::AppConfig, server::QueueServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mineru_queue=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     MinerU Queue Server                   ║
║            Batch Document Conversion Orchestrator         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Tool executable: {}", config.tool.executable);
    match &config.tool.conda_env {
        Some(env) => tracing::info!("  - Conda environment: {}", env),
        None => tracing::info!("  - Conda environment: none (PATH lookup)"),
    }
    tracing::info!("  - Settings file: {}", config.settings_path().display());
    tracing::info!("  - Pause between jobs: {}ms", config.queue.pause_ms);

    let server = QueueServer::new(config);

    // Check the conversion tool before accepting work
    tracing::info!("Probing conversion tool...");
    if server.state().resolver().probe().await {
        tracing::info!("Conversion tool is available");
    } else {
        tracing::warn!("Conversion tool not found; start requests will be rejected");
        tracing::warn!("Please install MinerU:");
        tracing::warn!("  1. Install conda (or point [tool] at a PATH install)");
        tracing::warn!("  2. conda create -n MinerU python=3.10 && conda activate MinerU");
        tracing::warn!("  3. pip install mineru");
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/queue          - Enqueue documents");
    println!("  GET    /api/queue          - List jobs");
    println!("  POST   /api/convert/start  - Start processing");
    println!("  POST   /api/convert/stop   - Stop processing");
    println!("  GET    /api/convert/status - Run status");
    println!("  GET    /api/events         - SSE event stream");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
