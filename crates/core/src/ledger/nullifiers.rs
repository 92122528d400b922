//! Per-mint spent nullifier set
//!
//! Monotonic: entries are never removed. `insert_all` is all-or-nothing and the
//! owning [`LedgerStore`](super::LedgerStore) calls it under the mint's
//! exclusive section.

use std::collections::BTreeSet;

use crate::crypto::FieldElement;
use crate::error::LedgerError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullifierSet {
    spent: BTreeSet<FieldElement>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, nullifier: &FieldElement) -> bool {
        self.spent.contains(nullifier)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Entries of `batch` that are already spent or repeated within the batch,
    /// in first-seen order.
    pub fn conflicts(&self, batch: &[FieldElement]) -> Vec<FieldElement> {
        let mut seen = BTreeSet::new();
        let mut duplicates = Vec::new();
        for n in batch {
            let repeated = !seen.insert(*n);
            if (repeated || self.spent.contains(n)) && !duplicates.contains(n) {
                duplicates.push(*n);
            }
        }
        duplicates
    }

    /// Insert every entry of `batch` or none of them.
    pub fn insert_all(&mut self, batch: &[FieldElement]) -> Result<usize, LedgerError> {
        let duplicates = self.conflicts(batch);
        if !duplicates.is_empty() {
            return Err(LedgerError::NullifierConflict { duplicates });
        }
        self.spent.extend(batch.iter().copied());
        Ok(batch.len())
    }

    /// Idempotent merge used by replication and the raw write path.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = FieldElement>) -> usize {
        let before = self.spent.len();
        self.spent.extend(batch);
        self.spent.len() - before
    }

    pub fn to_vec(&self) -> Vec<FieldElement> {
        self.spent.iter().copied().collect()
    }
}

impl FromIterator<FieldElement> for NullifierSet {
    fn from_iter<T: IntoIterator<Item = FieldElement>>(iter: T) -> Self {
        Self {
            spent: iter.into_iter().collect(),
        }
    }
}
