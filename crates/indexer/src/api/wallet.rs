use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shield_core::ledger::{ActivityEntry, Allowance};

use super::now_millis;
use crate::error::{ApiError, JsonBody};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AmountBody {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceBody {
    pub mint: String,
    pub amount: String,
}

/// One entry or a batch
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ActivityBody {
    Batch { entries: Vec<ActivityEntry> },
    Single(ActivityEntry),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub view_id: String,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize)]
pub struct Balances {
    pub owner: String,
    pub balances: BTreeMap<String, String>,
}

pub async fn get_allowance(
    State(state): State<AppState>,
    Path((owner, spender, mint)): Path<(String, String, String)>,
) -> Json<Allowance> {
    Json(state.ledger.wallet().allowance(&owner, &spender, &mint))
}

pub async fn post_allowance(
    State(state): State<AppState>,
    Path((owner, spender, mint)): Path<(String, String, String)>,
    JsonBody(body): JsonBody<AmountBody>,
) -> Result<Json<Allowance>, ApiError> {
    let allowance = state
        .ledger
        .wallet_mut()
        .set_allowance(&owner, &spender, &mint, &body.amount, now_millis())?;
    Ok(Json(allowance))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> Json<ActivityLog> {
    let activity = state.ledger.wallet().activity_of(&view_id);
    Json(ActivityLog {
        view_id: view_id.trim().to_string(),
        activity,
    })
}

pub async fn post_activity(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    JsonBody(body): JsonBody<ActivityBody>,
) -> Result<Json<ActivityLog>, ApiError> {
    let entries = match body {
        ActivityBody::Batch { entries } => entries,
        ActivityBody::Single(entry) => vec![entry],
    };
    let activity = state.ledger.wallet_mut().record_activity(&view_id, entries)?;
    Ok(Json(ActivityLog {
        view_id: view_id.trim().to_string(),
        activity,
    }))
}

pub async fn get_balances(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<Balances> {
    let balances = state.ledger.wallet().balances_of(&owner);
    Json(Balances {
        owner: owner.trim().to_string(),
        balances,
    })
}

pub async fn post_balance(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    JsonBody(body): JsonBody<BalanceBody>,
) -> Result<Json<Balances>, ApiError> {
    let balances = state
        .ledger
        .wallet_mut()
        .set_balance(&owner, &body.mint, &body.amount)?;
    Ok(Json(Balances {
        owner: owner.trim().to_string(),
        balances,
    }))
}
