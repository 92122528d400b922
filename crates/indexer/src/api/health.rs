use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use shield_core::proof::ProofMode;
use shield_core::registry::MintConfig;
use shield_core::CircuitKind;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UpstreamStatus {
    pub configured: bool,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStatus {
    pub real_artifacts: bool,
    pub mode: ProofMode,
    pub verifying_key_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub standalone: bool,
    pub upstream: UpstreamStatus,
    pub artifacts_dir: String,
    pub circuits: BTreeMap<&'static str, CircuitStatus>,
    pub mints: usize,
    pub root_window: usize,
}

/// Liveness plus capability flags
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let reachable = match &state.replicator {
        Some(replicator) => replicator.replica().ping().await,
        None => false,
    };

    let provers = state.coordinator.provers();
    let circuits = CircuitKind::ALL
        .into_iter()
        .map(|circuit| {
            let status = CircuitStatus {
                real_artifacts: provers.catalog().get(circuit).is_some_and(|a| a.is_real()),
                mode: provers.mode(circuit),
                verifying_key_hash: provers.catalog().verifying_key_hash(circuit),
            };
            (circuit.as_str(), status)
        })
        .collect();

    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        standalone: state.coordinator.is_standalone(),
        upstream: UpstreamStatus {
            configured: state.replicator.is_some(),
            reachable,
        },
        artifacts_dir: provers.catalog().dir().display().to_string(),
        circuits,
        mints: state.ledger.mints().len(),
        root_window: state.ledger.window(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintList {
    pub default_fee_bps: u16,
    pub mints: Vec<MintConfig>,
}

pub async fn list_mints(State(state): State<AppState>) -> Json<MintList> {
    Json(MintList {
        default_fee_bps: state.registry.default_fee_bps(),
        mints: state.registry.list(),
    })
}
