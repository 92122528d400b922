//! Commitment tree accumulator
//!
//! A rolling root: every state transition folds the prior root and the new
//! leaves into a single Poseidon digest, `root' = H(root, leaf_0, .., leaf_n)`.
//! There are no per-leaf paths. The paired circuits compute exactly this fold,
//! so it must not be swapped for an indexed Merkle tree.

use super::poseidon::{poseidon_hash, PoseidonError, MAX_ARITY};
use super::FieldElement;

/// Most leaves a single transition can fold in (one arity slot holds the root)
pub const MAX_LEAVES: usize = MAX_ARITY - 1;

/// Derive the root that follows `prior` after appending `leaves`.
pub fn next_root(prior: FieldElement, leaves: &[FieldElement]) -> Result<FieldElement, PoseidonError> {
    if leaves.is_empty() {
        return Err(PoseidonError::EmptyInput);
    }
    let mut inputs = Vec::with_capacity(leaves.len() + 1);
    inputs.push(prior);
    inputs.extend_from_slice(leaves);
    poseidon_hash(&inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::poseidon::poseidon_hash2;

    #[test]
    fn test_single_leaf_is_hash_of_pair() {
        let prior = FieldElement::from_u64(11);
        let leaf = FieldElement::from_u64(22);
        assert_eq!(
            next_root(prior, &[leaf]).unwrap(),
            poseidon_hash2(prior, leaf).unwrap()
        );
    }

    #[test]
    fn test_two_leaves_fold_flat() {
        let prior = FieldElement::from_u64(1);
        let a = FieldElement::from_u64(2);
        let b = FieldElement::from_u64(3);
        let flat = poseidon_hash(&[prior, a, b]).unwrap();
        assert_eq!(next_root(prior, &[a, b]).unwrap(), flat);

        let nested = next_root(next_root(prior, &[a]).unwrap(), &[b]).unwrap();
        assert_ne!(flat, nested);
    }

    #[test]
    fn test_empty_leaves_rejected() {
        assert_eq!(
            next_root(FieldElement::zero(), &[]),
            Err(PoseidonError::EmptyInput)
        );
    }
}
