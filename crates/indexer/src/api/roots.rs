use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shield_core::ledger::{RootWindow, Source};
use shield_core::FieldElement;

use super::mint_key;
use crate::error::{ApiError, JsonBody};
use crate::{source_of, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsResponse {
    pub mint: String,
    pub current: FieldElement,
    pub recent: Vec<FieldElement>,
    pub source: Source,
}

impl RootsResponse {
    fn new(mint: String, window: RootWindow, source: Source) -> Self {
        Self {
            mint,
            current: window.current,
            recent: window.recent,
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RootsUpdate {
    pub current: FieldElement,
    #[serde(default)]
    pub recent: Option<Vec<FieldElement>>,
}

pub async fn get_roots(
    State(state): State<AppState>,
    Path(mint): Path<String>,
) -> Result<Json<RootsResponse>, ApiError> {
    let mint = mint_key(&mint)?;
    let refreshed = state.refresh(&mint).await.is_some_and(|r| r.roots);
    let (window, stored) = state
        .ledger
        .roots_with_source(&mint)
        .ok_or_else(|| ApiError::mint_not_found(&mint))?;
    Ok(Json(RootsResponse::new(mint, window, source_of(refreshed, stored))))
}

pub async fn post_roots(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    JsonBody(update): JsonBody<RootsUpdate>,
) -> Result<Json<RootsResponse>, ApiError> {
    let mint = mint_key(&mint)?;
    let window = state
        .ledger
        .upsert_roots(&mint, update.current, update.recent, Source::Cache)?;
    Ok(Json(RootsResponse::new(mint, window, Source::Cache)))
}
