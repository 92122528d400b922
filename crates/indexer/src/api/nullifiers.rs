use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use shield_core::ledger::Source;
use shield_core::proof::PayloadReader;
use shield_core::FieldElement;

use super::mint_key;
use crate::error::{ApiError, JsonBody};
use crate::{source_of, AppState};

#[derive(Debug, Serialize)]
pub struct NullifiersResponse {
    pub mint: String,
    pub nullifiers: Vec<FieldElement>,
    pub source: Source,
}

/// Unknown mints have spent nothing yet.
pub async fn get_nullifiers(
    State(state): State<AppState>,
    Path(mint): Path<String>,
) -> Result<Json<NullifiersResponse>, ApiError> {
    let mint = mint_key(&mint)?;
    let refreshed = state.refresh(&mint).await.is_some_and(|r| r.nullifiers);
    let (nullifiers, stored) = state
        .ledger
        .nullifiers_with_source(&mint)
        .unwrap_or((Vec::new(), Source::Cache));
    Ok(Json(NullifiersResponse {
        mint,
        nullifiers,
        source: source_of(refreshed, stored),
    }))
}

/// Idempotent merge of at least one nullifier; returns the full set.
pub async fn post_nullifiers(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<NullifiersResponse>, ApiError> {
    let mint = mint_key(&mint)?;
    let batch = PayloadReader::new(&body)?.fields("nullifiers", 1)?;
    let nullifiers = state.ledger.merge_nullifiers(&mint, &batch, Source::Cache)?;
    Ok(Json(NullifiersResponse {
        mint,
        nullifiers,
        source: Source::Cache,
    }))
}
