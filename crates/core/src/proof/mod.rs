//! Proof pipeline
//!
//! - `payload`: structural validation of caller payloads
//! - `inputs`: public input derivation per circuit
//! - `prover`: prover capability (external backend or deterministic mock)
//! - `coordinator`: derive, check against the ledger, prove

pub mod coordinator;
pub mod inputs;
pub mod payload;
pub mod prover;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::FieldElement;

pub use coordinator::{CoordinatorConfig, ProofCoordinator};
pub use inputs::{derive, derive_shield, derive_transfer, derive_unshield, DerivedInputs};
pub use payload::{
    CircuitPayload, PayloadError, PayloadIssue, PayloadReader, ShieldPayload, TransferPayload, UnshieldMode,
    UnshieldPayload,
};
pub use prover::{
    ArtifactCatalog, CircuitArtifacts, CommandProver, MockProver, Prover, ProverRequest, ProverSet,
};

/// Size of a serialized Groth16 proof: A (64) || B (128) || C (64)
pub const PROOF_SIZE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitKind {
    Shield,
    Transfer,
    Unshield,
}

impl CircuitKind {
    pub const ALL: [CircuitKind; 3] = [CircuitKind::Shield, CircuitKind::Transfer, CircuitKind::Unshield];

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitKind::Shield => "shield",
            CircuitKind::Transfer => "transfer",
            CircuitKind::Unshield => "unshield",
        }
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shield" => Ok(CircuitKind::Shield),
            "transfer" => Ok(CircuitKind::Transfer),
            "unshield" => Ok(CircuitKind::Unshield),
            other => Err(format!("unknown circuit {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMode {
    Groth16,
    Mock,
}

/// Values derived alongside the public inputs, echoed back to the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedEcho {
    pub old_root: FieldElement,
    pub new_root: FieldElement,
    pub nullifiers: Vec<FieldElement>,
    pub commitments: Vec<FieldElement>,
    pub amount_commitments: Vec<FieldElement>,
}

/// Terminal `Proved` state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub circuit: CircuitKind,
    pub mode: ProofMode,
    /// `0x`-prefixed hex
    pub proof: String,
    pub public_inputs: Vec<FieldElement>,
    pub verifying_key_hash: String,
    pub derived: DerivedEcho,
}
