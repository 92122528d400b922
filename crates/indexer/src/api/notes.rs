use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shield_core::ledger::{Note, NotePage, NoteQuery, Source};
use tracing::{debug, warn};

use super::{mint_key, note_query, NoteParams};
use crate::error::{ApiError, JsonBody};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingKeyNotes {
    pub viewing_key: String,
    pub notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
pub struct NotesUpload {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintNotes {
    pub mint: String,
    #[serde(flatten)]
    pub page: NotePage,
    pub source: Source,
}

fn viewing_key(raw: &str) -> Result<String, ApiError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ApiError::invalid_payload("viewingKey must not be empty"));
    }
    Ok(key.to_string())
}

pub async fn get_notes(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ViewingKeyNotes>, ApiError> {
    let viewing_key = viewing_key(&key)?;
    let notes = state.ledger.notes_for(&viewing_key);
    Ok(Json(ViewingKeyNotes { viewing_key, notes }))
}

/// Replace the viewing key's partition wholesale.
pub async fn put_notes(
    State(state): State<AppState>,
    Path(key): Path<String>,
    JsonBody(upload): JsonBody<NotesUpload>,
) -> Result<Json<ViewingKeyNotes>, ApiError> {
    let viewing_key = viewing_key(&key)?;
    debug!(viewing_key = %viewing_key, notes = upload.notes.len(), "replacing notes");
    state.ledger.replace_notes(&viewing_key, upload.notes);
    let notes = state.ledger.notes_for(&viewing_key);
    Ok(Json(ViewingKeyNotes { viewing_key, notes }))
}

/// Upstream page when reachable, local index otherwise
pub(crate) async fn mint_page(state: &AppState, mint: &str, query: &NoteQuery) -> (NotePage, Source) {
    if let Some(replicator) = &state.replicator {
        match replicator.replica().notes_by_mint(mint, query).await {
            Ok(Some(page)) => return (page, Source::Upstream),
            Ok(None) => {}
            Err(e) => warn!(mint, error = %e, "upstream notes unavailable, serving local index"),
        }
    }
    (state.ledger.notes_by_mint(mint, query), Source::Cache)
}

pub async fn notes_by_mint(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    params: Result<Query<NoteParams>, QueryRejection>,
) -> Result<Json<MintNotes>, ApiError> {
    let mint = mint_key(&mint)?;
    let query = note_query(params)?;
    let (page, source) = mint_page(&state, &mint, &query).await;
    Ok(Json(MintNotes { mint, page, source }))
}
