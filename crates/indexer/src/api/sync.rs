use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use shield_core::ledger::{Note, RootWindow, Source};
use shield_core::FieldElement;

use super::notes::mint_page;
use super::{mint_key, note_query, NoteParams};
use crate::error::ApiError;
use crate::{source_of, AppState};

#[derive(Debug, Serialize)]
pub struct SyncSources {
    /// Absent when the mint has no roots anywhere
    pub roots: Option<Source>,
    pub nullifiers: Source,
    pub notes: Source,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub mint: String,
    pub roots: Option<RootWindow>,
    pub nullifiers: Vec<FieldElement>,
    pub notes: Vec<Note>,
    pub cursor: Option<u64>,
    pub has_more: bool,
    pub sources: SyncSources,
}

/// Roots, nullifiers and a page of notes for one mint in a single response.
pub async fn sync(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    params: Result<Query<NoteParams>, QueryRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let mint = mint_key(&mint)?;
    let query = note_query(params)?;

    let refreshed = state.refresh(&mint).await.unwrap_or_default();
    let (page, notes_source) = mint_page(&state, &mint, &query).await;

    let roots = state.ledger.roots_with_source(&mint);
    let (nullifiers, nullifiers_source) = state
        .ledger
        .nullifiers_with_source(&mint)
        .unwrap_or((Vec::new(), Source::Cache));

    Ok(Json(SyncResponse {
        sources: SyncSources {
            roots: roots.as_ref().map(|(_, s)| source_of(refreshed.roots, *s)),
            nullifiers: source_of(refreshed.nullifiers, nullifiers_source),
            notes: notes_source,
        },
        mint,
        roots: roots.map(|(w, _)| w),
        nullifiers,
        notes: page.notes,
        cursor: page.cursor,
        has_more: page.has_more,
    }))
}
