//! Note commitments
//!
//! Commitments bind a note's amount, owner and blinding factor together with
//! the asset and pool it belongs to:
//!
//! - shield deposit: `H(amount, recipient, depositId, poolId, blinding)`
//! - transfer output / unshield change: `H(amount, recipient, mintId, poolId, blinding)`
//! - amount commitment: `H(amount, amountBlinding)`

use super::poseidon::{poseidon_hash, PoseidonError};
use super::FieldElement;

/// Opening of a note commitment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteOpening {
    pub amount: FieldElement,
    pub recipient: FieldElement,
    /// Deposit id for shield notes, mint id for transfer outputs and change
    pub binding: FieldElement,
    pub pool_id: FieldElement,
    pub blinding: FieldElement,
}

impl NoteOpening {
    pub fn commit(&self) -> Result<FieldElement, PoseidonError> {
        poseidon_hash(&[
            self.amount,
            self.recipient,
            self.binding,
            self.pool_id,
            self.blinding,
        ])
    }
}

pub fn shield_commitment(
    amount: FieldElement,
    recipient: FieldElement,
    deposit_id: FieldElement,
    pool_id: FieldElement,
    blinding: FieldElement,
) -> Result<FieldElement, PoseidonError> {
    NoteOpening {
        amount,
        recipient,
        binding: deposit_id,
        pool_id,
        blinding,
    }
    .commit()
}

pub fn output_commitment(
    amount: FieldElement,
    recipient: FieldElement,
    mint_id: FieldElement,
    pool_id: FieldElement,
    blinding: FieldElement,
) -> Result<FieldElement, PoseidonError> {
    NoteOpening {
        amount,
        recipient,
        binding: mint_id,
        pool_id,
        blinding,
    }
    .commit()
}

pub fn amount_commitment(
    amount: FieldElement,
    amount_blinding: FieldElement,
) -> Result<FieldElement, PoseidonError> {
    poseidon_hash(&[amount, amount_blinding])
}
