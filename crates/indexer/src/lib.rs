//! Shield Indexer
//!
//! HTTP service in front of the shielded pool ledger:
//!
//! - root windows and nullifier sets per mint, with upstream refresh
//! - encrypted note sync by viewing key and by mint
//! - read-only transfer validation
//! - public input derivation and proving for shield, transfer and unshield
//! - chain-event ingestion, the only path that advances ledger state
//! - wallet records (balances, activity, allowances)

pub mod api;
pub mod config;
pub mod error;
pub mod upstream;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use shield_core::ledger::Source;
use shield_core::proof::{CoordinatorConfig, ProverSet};
use shield_core::{LedgerStore, MintRegistry, ProofCoordinator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::Config;
pub use error::{ApiError, JsonBody};
pub use upstream::{HttpReplica, Refreshed, Replica, Replicator, UpstreamError};

/// Header accepted as an alternative to a bearer token
pub const API_KEY_HEADER: &str = "x-api-key";

/// Process-scoped state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub registry: Arc<MintRegistry>,
    pub coordinator: Arc<ProofCoordinator>,
    pub replicator: Option<Arc<Replicator>>,
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        ledger: Arc<LedgerStore>,
        registry: Arc<MintRegistry>,
        provers: ProverSet,
        config: CoordinatorConfig,
    ) -> Self {
        let coordinator = ProofCoordinator::new(
            Some(ledger.clone()),
            registry.clone(),
            Arc::new(provers),
            config,
        );
        Self {
            ledger,
            registry,
            coordinator: Arc::new(coordinator),
            replicator: None,
            auth_token: None,
        }
    }

    pub fn with_replica(mut self, replica: Arc<dyn Replica>) -> Self {
        self.replicator = Some(Arc::new(Replicator::new(replica, self.ledger.clone())));
        self
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.map(Arc::from);
        self
    }

    /// Best-effort refresh for read paths. `None` means local state is served.
    pub async fn refresh(&self, mint: &str) -> Option<Refreshed> {
        let replicator = self.replicator.as_ref()?;
        match replicator.refresh(mint).await {
            Ok(refreshed) => Some(refreshed),
            Err(e) => {
                warn!(mint, error = %e, "upstream unreachable, serving local state");
                None
            }
        }
    }

    /// Refresh required by write-validation paths; unreachable is an error.
    pub async fn refresh_strict(&self, mint: &str) -> Result<(), UpstreamError> {
        if let Some(replicator) = &self.replicator {
            replicator.refresh(mint).await?;
        }
        Ok(())
    }
}

/// Provenance reported to callers: upstream when this request refreshed it
pub(crate) fn source_of(refreshed: bool, stored: Source) -> Source {
    if refreshed {
        Source::Upstream
    } else {
        stored
    }
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.auth_token.as_deref() {
        let headers = request.headers();
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim);
        if bearer != Some(expected) && api_key != Some(expected) {
            return Err(ApiError::unauthorized());
        }
    }
    Ok(next.run(request).await)
}

/// Build the router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/mints", get(api::health::list_mints))
        .route("/roots/:mint", get(api::roots::get_roots).post(api::roots::post_roots))
        .route(
            "/nullifiers/:mint",
            get(api::nullifiers::get_nullifiers).post(api::nullifiers::post_nullifiers),
        )
        .route("/notes/mint/:mint", get(api::notes::notes_by_mint))
        .route(
            "/notes/:viewing_key",
            get(api::notes::get_notes).post(api::notes::put_notes),
        )
        .route("/sync/:mint", get(api::sync::sync))
        .route("/transfers/validate", post(api::transfers::validate))
        .route(
            "/allowances/:owner/:spender/:mint",
            get(api::wallet::get_allowance).post(api::wallet::post_allowance),
        )
        .route(
            "/activity/:view_id",
            get(api::wallet::get_activity).post(api::wallet::post_activity),
        )
        .route(
            "/balances/:owner",
            get(api::wallet::get_balances).post(api::wallet::post_balance),
        )
        .route("/prove/:circuit", post(api::prove::prove))
        .route("/ingest/:mint", post(api::ingest::ingest))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
