//! shield-indexer
//!
//! Loads the ledger snapshot, serves the HTTP API and flushes the snapshot
//! again on graceful shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shield_core::ledger::{LedgerSnapshot, SnapshotOrigin};
use shield_core::proof::{ArtifactCatalog, CoordinatorConfig, ProverSet};
use shield_core::{LedgerStore, MintRegistry};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shield_indexer::{app_router, AppState, Config, HttpReplica};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shield_indexer=info,shield_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let (snapshot, origin) = LedgerSnapshot::load(&config.snapshot_path, config.fixture_path.as_deref())
        .context("failed to load ledger snapshot")?;
    match &origin {
        SnapshotOrigin::Snapshot(path) => info!(path = %path.display(), "loaded snapshot"),
        SnapshotOrigin::Fixture(path) => info!(path = %path.display(), "loaded fixture"),
        SnapshotOrigin::Empty => info!("starting with an empty ledger"),
    }
    let ledger = Arc::new(LedgerStore::from_snapshot(snapshot, config.root_window));

    let registry = match &config.mint_registry {
        Some(path) => MintRegistry::load(path, config.fee_bps)
            .with_context(|| format!("failed to load mint registry {}", path.display()))?,
        None => MintRegistry::empty(config.fee_bps),
    };
    info!(mints = registry.len(), default_fee_bps = registry.default_fee_bps(), "mint registry ready");

    let catalog = ArtifactCatalog::load(&config.artifacts_dir);
    let provers = ProverSet::select(catalog, config.prover_cmd.as_deref(), config.prover_timeout());
    let coordinator_config = CoordinatorConfig {
        standalone: config.standalone,
        mock_fallback: !config.no_mock_fallback,
    };

    let mut state = AppState::new(ledger.clone(), Arc::new(registry), provers, coordinator_config)
        .with_auth_token(config.auth_token());
    if let Some(url) = &config.upstream_url {
        let replica = HttpReplica::new(url, config.upstream_timeout()).context("failed to build upstream client")?;
        info!(upstream = %replica.base_url(), "upstream replication enabled");
        state = state.with_replica(Arc::new(replica));
    }
    if state.auth_token.is_some() {
        info!("authentication required on all routes");
    }

    let poller = match (&state.replicator, config.poll_interval()) {
        (Some(replicator), Some(interval)) => Some(replicator.clone().spawn_poller(interval)),
        _ => None,
    };

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, "shield indexer listening");

    axum::serve(listener, app_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(poller) = poller {
        poller.abort();
    }

    if let Err(e) = ledger.snapshot().write(&config.snapshot_path) {
        error!(path = %config.snapshot_path.display(), error = %e, "snapshot flush failed");
        return Err(e.into());
    }
    info!(path = %config.snapshot_path.display(), "snapshot flushed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
