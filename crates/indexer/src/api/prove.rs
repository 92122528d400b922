use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use shield_core::proof::PayloadError;
use shield_core::{CircuitKind, ProofBundle};
use tracing::info;

use crate::error::{ApiError, JsonBody, CODE_UNKNOWN_CIRCUIT};
use crate::AppState;

/// `POST /prove/{circuit}` with `{payload}`
pub async fn prove(
    State(state): State<AppState>,
    Path(circuit): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ProofBundle>, ApiError> {
    let circuit = match circuit.parse::<CircuitKind>() {
        Ok(kind) => kind,
        Err(e) => return Err(ApiError::bad_request(CODE_UNKNOWN_CIRCUIT, e).with("circuit", circuit.into())),
    };
    let payload = body
        .get("payload")
        .filter(|p| !p.is_null())
        .ok_or_else(|| PayloadError::missing("payload"))?;

    let bundle = state.coordinator.prove(circuit, payload).await?;
    info!(%circuit, mode = ?bundle.mode, "proof served");
    Ok(Json(bundle))
}
