// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ytmdesk::application::{AppHost, Collaborators, HostConfig};
use ytmdesk::integrations::HttpUpdateFeed;

// Providers share one control thread; handlers interleave only at awaits.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 0. LOGGING
    // `log` records from the library are bridged into tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ytmdesk=debug,warn")),
        )
        .init();

    // 1. CONFIGURATION
    let config = HostConfig::from_env().context("failed to resolve host configuration")?;
    tracing::info!(
        config_dir = %config.config_dir.display(),
        development = config.is_development,
        "starting {} {}",
        config.app_name,
        config.app_version
    );

    // 2. COLLABORATORS
    let update_feed = Arc::new(HttpUpdateFeed::new().context("failed to build update client")?);
    let collaborators = Collaborators::headless(update_feed);

    // 3. PROVIDERS (WIRING)
    let host = AppHost::build(config, collaborators).context("failed to wire providers")?;

    // 4. LIFECYCLE
    for report in host.start().await {
        for failure in &report.failures {
            tracing::warn!(provider = %failure.provider, "{} hook failed: {}", report.phase, failure.error);
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    // 5. TEARDOWN
    let report = host.shutdown().await;
    if !report.is_clean() {
        tracing::warn!("{} teardown hooks failed", report.failures.len());
    }
    Ok(())
}
