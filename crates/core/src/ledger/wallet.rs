//! Auxiliary wallet records: balances, activity log and allowances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most recent entries retained per activity log
pub const ACTIVITY_LIMIT: usize = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("amount {0:?} is not a decimal integer")]
    InvalidAmount(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Validate and normalize a decimal amount string (leading zeros stripped).
pub fn normalize_amount(amount: &str) -> Result<String, WalletError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::InvalidAmount(amount.to_string()));
    }
    let stripped = trimmed.trim_start_matches('0');
    Ok(if stripped.is_empty() { "0".to_string() } else { stripped.to_string() })
}

fn required(value: &str, name: &'static str) -> Result<String, WalletError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WalletError::EmptyField(name));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Wrap,
    Unwrap,
    Transfer,
    TransferFrom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub signature: String,
    pub symbol: String,
    pub amount: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub owner: String,
    pub spender: String,
    pub mint: String,
    pub amount: String,
    pub updated: u64,
}

impl Allowance {
    pub fn key(owner: &str, spender: &str, mint: &str) -> String {
        format!("{}:{}:{}", owner.trim(), spender.trim(), mint.trim())
    }

    /// Placeholder returned for a pair that was never approved
    pub fn empty(owner: &str, spender: &str, mint: &str) -> Self {
        Self {
            owner: owner.trim().to_string(),
            spender: spender.trim().to_string(),
            mint: mint.trim().to_string(),
            amount: "0".to_string(),
            updated: 0,
        }
    }
}

/// Balances, activity and allowances, keyed as persisted in the snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletState {
    pub balances: BTreeMap<String, BTreeMap<String, String>>,
    pub activity: BTreeMap<String, Vec<ActivityEntry>>,
    pub allowances: BTreeMap<String, Allowance>,
}

impl WalletState {
    pub fn balances_of(&self, owner: &str) -> BTreeMap<String, String> {
        self.balances.get(owner.trim()).cloned().unwrap_or_default()
    }

    /// Last write wins.
    pub fn set_balance(&mut self, owner: &str, mint: &str, amount: &str) -> Result<BTreeMap<String, String>, WalletError> {
        let owner = required(owner, "owner")?;
        let mint = required(mint, "mint")?;
        let amount = normalize_amount(amount)?;
        let entry = self.balances.entry(owner).or_default();
        entry.insert(mint, amount);
        Ok(entry.clone())
    }

    pub fn activity_of(&self, view_id: &str) -> Vec<ActivityEntry> {
        self.activity.get(view_id.trim()).cloned().unwrap_or_default()
    }

    /// Merge entries into a log: dedupe by id (newer write wins), newest
    /// first, bounded to [`ACTIVITY_LIMIT`].
    pub fn record_activity(&mut self, view_id: &str, entries: Vec<ActivityEntry>) -> Result<Vec<ActivityEntry>, WalletError> {
        let view_id = required(view_id, "viewId")?;
        let log = self.activity.entry(view_id).or_default();
        for entry in entries {
            if entry.id.trim().is_empty() {
                return Err(WalletError::EmptyField("id"));
            }
            log.retain(|existing| existing.id != entry.id);
            log.push(entry);
        }
        log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        log.truncate(ACTIVITY_LIMIT);
        Ok(log.clone())
    }

    pub fn allowance(&self, owner: &str, spender: &str, mint: &str) -> Allowance {
        self.allowances
            .get(&Allowance::key(owner, spender, mint))
            .cloned()
            .unwrap_or_else(|| Allowance::empty(owner, spender, mint))
    }

    pub fn set_allowance(
        &mut self,
        owner: &str,
        spender: &str,
        mint: &str,
        amount: &str,
        updated: u64,
    ) -> Result<Allowance, WalletError> {
        let allowance = Allowance {
            owner: required(owner, "owner")?,
            spender: required(spender, "spender")?,
            mint: required(mint, "mint")?,
            amount: normalize_amount(amount)?,
            updated,
        };
        self.allowances
            .insert(Allowance::key(owner, spender, mint), allowance.clone());
        Ok(allowance)
    }
}
