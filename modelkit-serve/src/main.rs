//! ModelKit serving binary.
//!
//! Loads one model bundle at startup and serves it over HTTP:
//!
//!   modelkit-serve --bundle income-model.bundle --port 5000

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use modelkit_context::LoadedModel;
use modelkit_serve::{build_router, builtin_registry};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "modelkit-serve")]
#[command(about = "Serve a model bundle over HTTP")]
struct Args {
    /// Path to the model bundle file
    #[arg(short, long)]
    bundle: PathBuf,

    /// HTTP port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let registry = builtin_registry().context("Failed to build routine registry")?;
    let model = LoadedModel::load(&args.bundle, registry)
        .with_context(|| format!("Failed to load bundle {:?}", args.bundle))?;
    info!(
        model_id = model.model().model_id(),
        model_version = model.model().model_version(),
        endpoints = ?model.model().endpoint_names(),
        "model loaded"
    );

    let app = build_router(Arc::new(model));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;
    info!("Serving on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
