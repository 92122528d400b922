use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use shield_core::proof::PayloadReader;
use shield_core::{FieldElement, LedgerError};
use tracing::debug;

use super::{mint_key, required_string};
use crate::error::{ApiError, JsonBody};
use crate::AppState;

/// Canonicalized echo of an accepted transfer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTransfer {
    pub valid: bool,
    pub mint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<FieldElement>,
    pub old_root: FieldElement,
    pub nullifiers: Vec<FieldElement>,
    pub output_commitments: Vec<FieldElement>,
    pub output_amount_commitments: Vec<FieldElement>,
}

/// Read-only check of a pending transfer against the ledger. Nothing is
/// inserted; ingestion applies the transfer once it lands on chain.
pub async fn validate(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ValidatedTransfer>, ApiError> {
    let reader = PayloadReader::new(&body)?;
    let mint = mint_key(&required_string(&reader, "mint")?)?;
    let pool_id = reader.field_opt("poolId")?;
    let old_root = reader.field("oldRoot")?;
    let nullifiers = reader.fields("nullifiers", 1)?;
    let output_commitments = reader.fields("outputCommitments", 1)?;
    let output_amount_commitments = reader.fields("outputAmountCommitments", 0)?;

    if output_commitments.len() != output_amount_commitments.len() {
        return Err(LedgerError::OutputSetMismatch {
            commitments: output_commitments.len(),
            amount_commitments: output_amount_commitments.len(),
        }
        .into());
    }

    state.refresh_strict(&mint).await?;
    state.ledger.check_spend(&mint, &old_root, &nullifiers)?;
    debug!(mint = %mint, nullifiers = nullifiers.len(), "transfer validated");

    Ok(Json(ValidatedTransfer {
        valid: true,
        mint,
        pool_id,
        old_root,
        nullifiers,
        output_commitments,
        output_amount_commitments,
    }))
}
