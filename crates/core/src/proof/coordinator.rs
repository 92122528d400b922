//! Proof coordinator
//!
//! `Received -> InputsDerived -> ConsistencyChecked -> Proved | Rejected`.
//!
//! The ledger is only read here. Roots advance and nullifiers get inserted
//! through ingestion, never through proving, so a cancelled or timed-out
//! prover leaves nothing half-applied. The prover runs outside every ledger
//! lock.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::inputs::{derive, DerivedInputs};
use super::payload::{CircuitPayload, PayloadError};
use super::prover::{MockProver, ProverRequest, ProverSet};
use super::{CircuitKind, ProofBundle, ProofMode};
use crate::crypto::FieldElement;
use crate::error::ProofError;
use crate::ledger::LedgerStore;
use crate::registry::{FeatureFlags, MintRegistry};

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    /// Skip ledger consistency checks entirely
    pub standalone: bool,
    /// Fall back to the mock transcript once when a real prover fails
    pub mock_fallback: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            standalone: false,
            mock_fallback: true,
        }
    }
}

pub struct ProofCoordinator {
    ledger: Option<Arc<LedgerStore>>,
    registry: Arc<MintRegistry>,
    provers: Arc<ProverSet>,
    config: CoordinatorConfig,
}

impl ProofCoordinator {
    pub fn new(
        ledger: Option<Arc<LedgerStore>>,
        registry: Arc<MintRegistry>,
        provers: Arc<ProverSet>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            ledger,
            registry,
            provers,
            config,
        }
    }

    pub fn provers(&self) -> &ProverSet {
        &self.provers
    }

    pub fn is_standalone(&self) -> bool {
        self.config.standalone || self.ledger.is_none()
    }

    /// Run one proof request through the full pipeline.
    pub async fn prove(&self, circuit: CircuitKind, payload: &Value) -> Result<ProofBundle, ProofError> {
        debug!(%circuit, state = "received");
        let result = self.run(circuit, payload).await;
        match &result {
            Ok(bundle) => debug!(%circuit, mode = ?bundle.mode, state = "proved"),
            Err(err) => debug!(%circuit, error = %err, state = "rejected"),
        }
        result
    }

    async fn run(&self, circuit: CircuitKind, payload: &Value) -> Result<ProofBundle, ProofError> {
        let parsed = CircuitPayload::parse(circuit, payload)?;
        let mint = match parsed.mint() {
            Some(mint) => Some(mint.to_string()),
            None if !self.is_standalone() => return Err(PayloadError::missing("mint").into()),
            None => None,
        };
        if let Some(mint) = mint.as_deref() {
            self.check_policy(circuit, mint)?;
        }

        let fee_bps = mint
            .as_deref()
            .map(|m| self.registry.fee_bps(m))
            .unwrap_or_else(|| self.registry.default_fee_bps());
        let derived = derive(&parsed, fee_bps)?;
        debug!(%circuit, new_root = %derived.new_root, state = "inputs_derived");

        if let (Some(ledger), Some(mint), false) = (self.ledger.as_ref(), mint.as_deref(), self.config.standalone) {
            check_consistency(ledger, mint, &derived)?;
            debug!(%circuit, mint, state = "consistency_checked");
        }

        let request = ProverRequest {
            circuit,
            payload: payload.clone(),
            public_inputs: derived.public_inputs.clone(),
            verifying_key_hash: self.provers.catalog().verifying_key_hash(circuit),
        };
        let (proof, mode) = self.invoke(&request).await?;

        Ok(ProofBundle {
            circuit,
            mode,
            proof: format!("0x{}", hex::encode(proof)),
            public_inputs: derived.public_inputs.clone(),
            verifying_key_hash: request.verifying_key_hash,
            derived: derived.echo(),
        })
    }

    fn check_policy(&self, circuit: CircuitKind, mint: &str) -> Result<(), ProofError> {
        let Some(config) = self.registry.get(mint) else {
            return Ok(());
        };
        if config.is_frozen() {
            return Err(ProofError::MintFrozen(config.mint.clone()));
        }
        if circuit == CircuitKind::Transfer && !config.features.contains(FeatureFlags::PRIVATE_TRANSFER) {
            return Err(ProofError::FeatureDisabled {
                mint: config.mint.clone(),
                feature: "private_transfer",
            });
        }
        Ok(())
    }

    async fn invoke(&self, request: &ProverRequest) -> Result<(Vec<u8>, ProofMode), ProofError> {
        let prover = self.provers.prover(request.circuit);
        let mode = prover.mode();
        match prover.prove(request).await {
            Ok(proof) => Ok((proof, mode)),
            Err(err) if mode == ProofMode::Groth16 && self.config.mock_fallback => {
                warn!(circuit = %request.circuit, error = %err, "prover failed, serving mock transcript");
                let proof = MockProver::transcript(request)?;
                Ok((proof, ProofMode::Mock))
            }
            Err(err) => Err(err),
        }
    }
}

/// Claimed root must be known (a zero root is accepted for a mint with no
/// history yet) and no derived nullifier may be spent or repeated.
/// A non-zero root against a mint with no history is an unknown root.
fn check_consistency(ledger: &LedgerStore, mint: &str, derived: &DerivedInputs) -> Result<(), ProofError> {
    match ledger.roots(mint) {
        Some(window) if window.contains(&derived.old_root) => {}
        Some(window) => {
            return Err(ProofError::UnknownRoot {
                claimed: derived.old_root,
                expected: Some(window.current),
                recent: window.recent,
            })
        }
        None if derived.old_root == FieldElement::zero() => {}
        None => {
            return Err(ProofError::UnknownRoot {
                claimed: derived.old_root,
                expected: None,
                recent: Vec::new(),
            })
        }
    }

    let duplicates = ledger.spent_among(mint, &derived.nullifiers);
    if !duplicates.is_empty() {
        return Err(ProofError::NullifierReused { duplicates });
    }
    Ok(())
}
