//! Route handlers

pub mod health;
pub mod ingest;
pub mod notes;
pub mod nullifiers;
pub mod prove;
pub mod roots;
pub mod sync;
pub mod transfers;
pub mod wallet;

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use serde::Deserialize;
use shield_core::ledger::{normalize_mint, NoteQuery};
use shield_core::proof::{PayloadError, PayloadReader};

use crate::error::ApiError;

/// `afterSlot`, `viewTag` and `limit` query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteParams {
    pub after_slot: Option<u64>,
    pub view_tag: Option<String>,
    pub limit: Option<usize>,
}

impl From<NoteParams> for NoteQuery {
    fn from(params: NoteParams) -> Self {
        NoteQuery {
            after_slot: params.after_slot,
            view_tag: params.view_tag.filter(|t| !t.trim().is_empty()),
            limit: params.limit,
        }
    }
}

pub(crate) fn note_query(params: Result<Query<NoteParams>, QueryRejection>) -> Result<NoteQuery, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::invalid_payload(e.body_text()))?;
    Ok(params.into())
}

pub(crate) fn mint_key(mint: &str) -> Result<String, ApiError> {
    Ok(normalize_mint(mint)?)
}

pub(crate) fn required_string(reader: &PayloadReader<'_>, name: &str) -> Result<String, PayloadError> {
    reader
        .string_opt(name)?
        .ok_or_else(|| PayloadError::missing(name))
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
