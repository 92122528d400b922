use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use shield_core::ledger::Transition;
use shield_core::proof::PayloadReader;
use shield_core::LedgerError;

use super::mint_key;
use crate::error::{ApiError, JsonBody};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Ingested {
    pub mint: String,
    #[serde(flatten)]
    pub transition: Transition,
}

/// Apply an on-chain transition `{oldRoot?, newRoot, nullifiers?}`.
pub async fn ingest(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Ingested>, ApiError> {
    let mint = mint_key(&mint)?;
    if state.registry.get(&mint).is_some_and(|c| c.is_frozen()) {
        return Err(LedgerError::MintFrozen(mint).into());
    }

    let reader = PayloadReader::new(&body)?;
    let old_root = reader.field_opt("oldRoot")?;
    let new_root = reader.field("newRoot")?;
    let nullifiers = reader.fields("nullifiers", 0)?;

    let transition = state
        .ledger
        .apply_transition(&mint, old_root.as_ref(), new_root, &nullifiers)?;
    Ok(Json(Ingested { mint, transition }))
}
