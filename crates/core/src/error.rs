//! Ledger and proving errors
//!
//! Concern-level errors live next to the code that raises them
//! (`CodecError`, `PoseidonError`, `PayloadError`, ...). This module holds the
//! two that cross module boundaries.

use std::time::Duration;

use thiserror::Error;

use crate::crypto::{FieldElement, PoseidonError};
use crate::proof::PayloadError;

/// Errors from ledger reads and writes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Mint not found: {0}")]
    MintNotFound(String),

    #[error("Invalid mint identifier")]
    InvalidMint,

    #[error("Root mismatch: expected {expected} or one of {} recent roots", .recent.len())]
    RootMismatch {
        expected: FieldElement,
        recent: Vec<FieldElement>,
    },

    #[error("Nullifier conflict: {} already spent", .duplicates.len())]
    NullifierConflict { duplicates: Vec<FieldElement> },

    #[error("Output set mismatch: {commitments} commitments vs {amount_commitments} amount commitments")]
    OutputSetMismatch {
        commitments: usize,
        amount_commitments: usize,
    },

    #[error("Mint {0} is frozen")]
    MintFrozen(String),
}

/// Errors from the proof pipeline
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("Hash derivation failed: {0}")]
    Derivation(#[from] PoseidonError),

    #[error("Negative change: note amount {note_amount} is below amount plus fee {required}")]
    NegativeChange { note_amount: u64, required: u128 },

    #[error("Missing change fields: {}", .0.join(", "))]
    MissingChangeFields(Vec<&'static str>),

    #[error("Unknown root {claimed}")]
    UnknownRoot {
        claimed: FieldElement,
        expected: Option<FieldElement>,
        recent: Vec<FieldElement>,
    },

    #[error("Nullifier reused: {} already spent", .duplicates.len())]
    NullifierReused { duplicates: Vec<FieldElement> },

    #[error("Mint not found: {0}")]
    MintNotFound(String),

    #[error("Mint {0} is frozen")]
    MintFrozen(String),

    #[error("Feature {feature} disabled for mint {mint}")]
    FeatureDisabled { mint: String, feature: &'static str },

    #[error("Prover failure: {0}")]
    ProverFailure(String),

    #[error("Prover timed out after {0:?}")]
    ProverTimeout(Duration),
}

impl ProofError {
    /// Caller faults are never retried and map to 4xx at the HTTP edge.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ProofError::Derivation(_) | ProofError::ProverFailure(_) | ProofError::ProverTimeout(_)
        )
    }
}
