//! Public input derivation
//!
//! One pure function per circuit. Each returns the ordered public inputs the
//! circuit exposes plus the derived roots, nullifiers and commitments. The
//! orderings below are part of the circuit interface:
//!
//! - shield: `[oldRoot, newRoot, commitment, mintId, poolId, depositId]`
//! - transfer: `[oldRoot, newRoot, nullifiers.., outputs.., mintId, poolId]`
//! - unshield: `[oldRoot, newRoot, nullifier, changeCommitment,
//!   changeAmountCommitment, amount, fee, destination, mode, mintId, poolId]`

use crate::crypto::{
    amount_commitment, next_root, output_commitment, shield_commitment, FieldElement, SpendingKey,
};
use crate::error::ProofError;
use crate::registry::calculate_fee;

use super::payload::{CircuitPayload, ShieldPayload, TransferPayload, UnshieldPayload};
use super::{CircuitKind, DerivedEcho};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedInputs {
    pub circuit: CircuitKind,
    pub public_inputs: Vec<FieldElement>,
    pub old_root: FieldElement,
    pub new_root: FieldElement,
    pub nullifiers: Vec<FieldElement>,
    pub commitments: Vec<FieldElement>,
    pub amount_commitments: Vec<FieldElement>,
}

impl DerivedInputs {
    pub fn echo(&self) -> DerivedEcho {
        DerivedEcho {
            old_root: self.old_root,
            new_root: self.new_root,
            nullifiers: self.nullifiers.clone(),
            commitments: self.commitments.clone(),
            amount_commitments: self.amount_commitments.clone(),
        }
    }
}

pub fn derive_shield(p: &ShieldPayload) -> Result<DerivedInputs, ProofError> {
    let amount = FieldElement::from_u64(p.amount);
    let commitment = shield_commitment(amount, p.recipient, p.deposit_id, p.pool_id, p.blinding)?;
    let new_root = next_root(p.old_root, &[commitment])?;

    Ok(DerivedInputs {
        circuit: CircuitKind::Shield,
        public_inputs: vec![p.old_root, new_root, commitment, p.mint_id, p.pool_id, p.deposit_id],
        old_root: p.old_root,
        new_root,
        nullifiers: Vec::new(),
        commitments: vec![commitment],
        amount_commitments: Vec::new(),
    })
}

pub fn derive_transfer(p: &TransferPayload) -> Result<DerivedInputs, ProofError> {
    let nullifiers = p
        .inputs
        .iter()
        .map(|i| SpendingKey::new(i.spending_key).nullify(i.note_id).map(|n| n.as_field()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut commitments = Vec::with_capacity(p.outputs.len());
    let mut amount_commitments = Vec::with_capacity(p.outputs.len());
    for output in &p.outputs {
        let amount = FieldElement::from_u64(output.amount);
        commitments.push(output_commitment(
            amount,
            output.recipient,
            p.mint_id,
            p.pool_id,
            output.blinding,
        )?);
        amount_commitments.push(amount_commitment(amount, output.amount_blinding)?);
    }

    let new_root = next_root(p.old_root, &nullifiers)?;

    let mut public_inputs = Vec::with_capacity(4 + nullifiers.len() + commitments.len());
    public_inputs.push(p.old_root);
    public_inputs.push(new_root);
    public_inputs.extend_from_slice(&nullifiers);
    public_inputs.extend_from_slice(&commitments);
    public_inputs.push(p.mint_id);
    public_inputs.push(p.pool_id);

    Ok(DerivedInputs {
        circuit: CircuitKind::Transfer,
        public_inputs,
        old_root: p.old_root,
        new_root,
        nullifiers,
        commitments,
        amount_commitments,
    })
}

/// `fee_bps` applies only when the payload carries no explicit fee.
pub fn derive_unshield(p: &UnshieldPayload, fee_bps: u16) -> Result<DerivedInputs, ProofError> {
    let fee = p.fee.unwrap_or_else(|| calculate_fee(p.amount, fee_bps));
    let required = p.amount as u128 + fee as u128;
    let note_amount = match p.note_amount {
        Some(n) => n as u128,
        None => required,
    };
    if note_amount < required {
        return Err(ProofError::NegativeChange {
            note_amount: p.note_amount.unwrap_or_default(),
            required,
        });
    }
    let change = note_amount - required;

    let nullifier = SpendingKey::new(p.spending_key).nullify(p.note_id)?.as_field();

    let (change_commitment, change_amount_commitment) = if change > 0 {
        let mut missing = Vec::new();
        if p.recipient.is_none() {
            missing.push("recipient");
        }
        if p.blinding.is_none() {
            missing.push("blinding");
        }
        if p.amount_blinding.is_none() {
            missing.push("amountBlinding");
        }
        if !missing.is_empty() {
            return Err(ProofError::MissingChangeFields(missing));
        }
        let change_fe = FieldElement::from_u128(change);
        (
            output_commitment(
                change_fe,
                p.recipient.unwrap_or_default(),
                p.mint_id,
                p.pool_id,
                p.blinding.unwrap_or_default(),
            )?,
            amount_commitment(change_fe, p.amount_blinding.unwrap_or_default())?,
        )
    } else {
        (FieldElement::zero(), FieldElement::zero())
    };

    let new_root = next_root(
        p.old_root,
        &[nullifier, change_commitment, change_amount_commitment],
    )?;

    let (commitments, amount_commitments) = if change > 0 {
        (vec![change_commitment], vec![change_amount_commitment])
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(DerivedInputs {
        circuit: CircuitKind::Unshield,
        public_inputs: vec![
            p.old_root,
            new_root,
            nullifier,
            change_commitment,
            change_amount_commitment,
            FieldElement::from_u64(p.amount),
            FieldElement::from_u64(fee),
            p.destination,
            p.mode.as_field(),
            p.mint_id,
            p.pool_id,
        ],
        old_root: p.old_root,
        new_root,
        nullifiers: vec![nullifier],
        commitments,
        amount_commitments,
    })
}

/// Derive public inputs for any validated payload.
pub fn derive(payload: &CircuitPayload, fee_bps: u16) -> Result<DerivedInputs, ProofError> {
    match payload {
        CircuitPayload::Shield(p) => derive_shield(p),
        CircuitPayload::Transfer(p) => derive_transfer(p),
        CircuitPayload::Unshield(p) => derive_unshield(p, fee_bps),
    }
}
