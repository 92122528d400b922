//! Nullifier derivation for double-spend prevention
//!
//! `nullifier = H(noteId, spendingKey)`. The same note spent with the same key
//! always yields the same nullifier, which is what lets the ledger detect reuse.

use super::poseidon::{poseidon_hash2, PoseidonError};
use super::FieldElement;

/// Spending key as seen by the circuit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendingKey(FieldElement);

impl SpendingKey {
    pub fn new(key: FieldElement) -> Self {
        Self(key)
    }

    /// Derive the nullifier for the note identified by `note_id`
    pub fn nullify(&self, note_id: FieldElement) -> Result<Nullifier, PoseidonError> {
        derive_nullifier(note_id, self.0).map(Nullifier)
    }
}

/// Published nullifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nullifier(FieldElement);

impl Nullifier {
    pub fn as_field(&self) -> FieldElement {
        self.0
    }
}

pub fn derive_nullifier(
    note_id: FieldElement,
    spending_key: FieldElement,
) -> Result<FieldElement, PoseidonError> {
    poseidon_hash2(note_id, spending_key)
}
