//! Encrypted note index for wallet synchronization
//!
//! Notes are partitioned by viewing key. Upstream sync replaces a partition
//! wholesale; the per-mint view is computed on read across all partitions.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::crypto::FieldElement;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub commitment: FieldElement,
    /// Opaque ciphertext, passed through untouched
    pub ciphertext: String,
    pub mint: String,
    pub slot: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_index: Option<u64>,
}

impl Note {
    fn order_key(&self) -> (u64, u64) {
        (self.slot, self.leaf_index.unwrap_or(0))
    }
}

/// Filters for the per-mint view
#[derive(Clone, Debug, Default)]
pub struct NoteQuery {
    /// Strict lower bound on `slot`
    pub after_slot: Option<u64>,
    pub view_tag: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Slot of the last returned note
    #[serde(default)]
    pub cursor: Option<u64>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Clone, Debug, Default)]
pub struct NoteIndex {
    by_viewing_key: BTreeMap<String, Vec<Note>>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_partitions(partitions: BTreeMap<String, Vec<Note>>) -> Self {
        let mut index = Self::new();
        for (key, notes) in partitions {
            index.replace(&key, notes);
        }
        index
    }

    /// Replace the full note list for a viewing key.
    pub fn replace(&mut self, viewing_key: &str, mut notes: Vec<Note>) {
        for note in notes.iter_mut() {
            note.mint = note.mint.trim().to_string();
        }
        notes.sort_by_key(Note::order_key);
        self.by_viewing_key
            .insert(viewing_key.trim().to_string(), notes);
    }

    pub fn for_viewing_key(&self, viewing_key: &str) -> Vec<Note> {
        self.by_viewing_key
            .get(viewing_key.trim())
            .cloned()
            .unwrap_or_default()
    }

    /// Notes for `mint` ordered by `(slot, leafIndex)`.
    pub fn query_by_mint(&self, mint: &str, query: &NoteQuery) -> NotePage {
        let mut seen = HashSet::new();
        let mut matching: Vec<Note> = self
            .by_viewing_key
            .values()
            .flatten()
            .filter(|n| n.mint == mint)
            .filter(|n| query.after_slot.map_or(true, |after| n.slot > after))
            .filter(|n| {
                query
                    .view_tag
                    .as_ref()
                    .map_or(true, |tag| n.view_tag.as_ref() == Some(tag))
            })
            .filter(|n| seen.insert(n.commitment))
            .cloned()
            .collect();
        matching.sort_by_key(Note::order_key);

        let has_more = match query.limit {
            Some(limit) => {
                let truncated = matching.len() > limit;
                matching.truncate(limit);
                truncated
            }
            None => false,
        };
        let cursor = matching.last().map(|n| n.slot);
        NotePage {
            notes: matching,
            cursor,
            has_more,
        }
    }

    pub fn partitions(&self) -> &BTreeMap<String, Vec<Note>> {
        &self.by_viewing_key
    }

    pub fn len(&self) -> usize {
        self.by_viewing_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
