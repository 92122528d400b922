//! Shield Ledger - Core
//!
//! Off-chain consistency layer for a shielded token pool.
//!
//! # Modules
//! - `crypto`: field element codec, Poseidon, commitments, nullifiers, root accumulator
//! - `ledger`: per-mint root windows and nullifier sets, note index, wallet records, snapshots
//! - `registry`: mint catalog (fees, status, feature flags)
//! - `proof`: payload validation, public input derivation, prover capability, coordinator

pub mod crypto;
pub mod error;
pub mod ledger;
pub mod proof;
pub mod registry;

pub use crypto::{to_canonical, CodecError, FieldElement, CODEC_ERROR_PREFIX};
pub use error::{LedgerError, ProofError};
pub use ledger::{LedgerSnapshot, LedgerStore, Source};
pub use proof::{CircuitKind, ProofBundle, ProofCoordinator, ProofMode};
pub use registry::{MintRegistry, FEE_BPS_DEFAULT};
