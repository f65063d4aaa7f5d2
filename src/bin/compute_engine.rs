//! # Compute Engine
//!
//! Runs one engine process over the in-memory queue store until Ctrl-C.
//! With `cluster.enabled` the process joins a fresh in-memory grid as its only
//! member.

use anyhow::Context;
use clap::Parser;
use compute_engine::cluster::{InMemoryGrid, MemberId, MembershipProvider};
use compute_engine::config::ConfigLoader;
use compute_engine::lifecycle::ComputeEngine;
use compute_engine::logging::init_structured_logging;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "compute-engine")]
#[command(about = "Run the background task compute engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); environment variables prefixed
    /// ENGINE_ override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    init_structured_logging(&config.logging);

    let mut builder = ComputeEngine::builder().config(config.clone());
    if config.cluster.enabled {
        let member_id = config
            .cluster
            .member_id
            .clone()
            .map(MemberId::from)
            .unwrap_or_default();
        let member: Arc<dyn MembershipProvider> = Arc::new(InMemoryGrid::new().join(member_id));
        builder = builder.membership_provider(member);
    }

    let engine = builder.build().context("building compute engine")?;
    engine.startup().await.context("starting compute engine")?;

    info!(
        diagnostics = %engine.diagnostics().await?.to_json()?,
        "Engine running - press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("Shutdown signal received");
    engine.shutdown().await.context("shutting down compute engine")?;
    Ok(())
}
