//! Poseidon Hash Function
//!
//! circom-compatible Poseidon over the BN254 scalar field, backed by
//! `light-poseidon`. Arity equals the number of inputs (1..=12), matching the
//! `Poseidon(n)` templates the shield/transfer/unshield circuits instantiate.
//! Any divergence here silently desynchronizes public inputs from the circuit.

use std::cell::RefCell;
use std::collections::HashMap;

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};
use thiserror::Error;

use super::FieldElement;

/// Largest arity supported by the circom parameter set
pub const MAX_ARITY: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseidonError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Invalid input length: expected at most {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Permutation failed: {0}")]
    Permutation(String),
}

thread_local! {
    static HASHERS: RefCell<HashMap<usize, Poseidon<Fr>>> = RefCell::new(HashMap::new());
}

/// Hash an ordered sequence of field elements with `Poseidon(inputs.len())`.
pub fn poseidon_hash(inputs: &[FieldElement]) -> Result<FieldElement, PoseidonError> {
    if inputs.is_empty() {
        return Err(PoseidonError::EmptyInput);
    }
    if inputs.len() > MAX_ARITY {
        return Err(PoseidonError::InvalidLength {
            expected: MAX_ARITY,
            got: inputs.len(),
        });
    }

    let elements: Vec<Fr> = inputs.iter().map(FieldElement::inner).collect();
    HASHERS.with(|cell| {
        let mut hashers = cell.borrow_mut();
        let hasher = match hashers.entry(elements.len()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(v) => {
                let fresh = Poseidon::<Fr>::new_circom(elements.len())
                    .map_err(|e| PoseidonError::Permutation(e.to_string()))?;
                v.insert(fresh)
            }
        };
        hasher
            .hash(&elements)
            .map(FieldElement::from)
            .map_err(|e| PoseidonError::Permutation(e.to_string()))
    })
}

/// Two-input convenience wrapper
pub fn poseidon_hash2(a: FieldElement, b: FieldElement) -> Result<FieldElement, PoseidonError> {
    poseidon_hash(&[a, b])
}
