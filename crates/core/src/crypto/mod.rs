//! Cryptographic primitives shared with the circuits

pub mod accumulator;
pub mod commitment;
pub mod field;
pub mod nullifier;
pub mod poseidon;

pub use accumulator::next_root;
pub use commitment::{amount_commitment, output_commitment, shield_commitment, NoteOpening};
pub use field::{to_canonical, CodecError, FieldElement, CODEC_ERROR_PREFIX};
pub use nullifier::{derive_nullifier, Nullifier, SpendingKey};
pub use poseidon::{poseidon_hash, poseidon_hash2, PoseidonError};
