//! Ledger store
//!
//! Aggregate state per mint (root window + spent nullifiers) plus the note
//! index and wallet records. Every mutation of a mint's roots or nullifiers
//! runs under that mint's exclusive section, so check-then-act sequences
//! (root validation followed by nullifier insertion) cannot interleave.
//! Different mints never contend.

pub mod notes;
pub mod nullifiers;
pub mod roots;
pub mod snapshot;
pub mod wallet;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use notes::{Note, NoteIndex, NotePage, NoteQuery};
pub use nullifiers::NullifierSet;
pub use roots::{RootWindow, DEFAULT_ROOT_WINDOW};
pub use snapshot::{LedgerSnapshot, SnapshotError, SnapshotOrigin};
pub use wallet::{ActivityEntry, ActivityKind, Allowance, WalletError, WalletState, ACTIVITY_LIMIT};

use crate::crypto::FieldElement;
use crate::error::LedgerError;

/// Provenance of a piece of ledger state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Refreshed from the upstream replica
    Upstream,
    /// Written locally since startup
    Cache,
    /// Loaded from the snapshot or fixture at startup
    Snapshot,
}

#[derive(Debug)]
struct MintLedger {
    roots: Option<RootWindow>,
    nullifiers: NullifierSet,
    roots_source: Source,
    nullifiers_source: Source,
}

impl MintLedger {
    fn empty() -> Self {
        Self {
            roots: None,
            nullifiers: NullifierSet::new(),
            roots_source: Source::Cache,
            nullifiers_source: Source::Cache,
        }
    }
}

/// Result of applying an on-chain transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub roots: RootWindow,
    pub inserted: usize,
}

/// Trim a mint key; empty keys are rejected.
pub fn normalize_mint(mint: &str) -> Result<String, LedgerError> {
    let trimmed = mint.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidMint);
    }
    Ok(trimmed.to_string())
}

pub struct LedgerStore {
    window: usize,
    mints: RwLock<HashMap<String, Arc<Mutex<MintLedger>>>>,
    notes: RwLock<NoteIndex>,
    wallet: RwLock<WalletState>,
}

impl LedgerStore {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            mints: RwLock::new(HashMap::new()),
            notes: RwLock::new(NoteIndex::new()),
            wallet: RwLock::new(WalletState::default()),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot, window: usize) -> Self {
        let mut mints: HashMap<String, MintLedger> = HashMap::new();
        for (mint, w) in snapshot.roots {
            let entry = mints.entry(mint.trim().to_string()).or_insert_with(MintLedger::empty);
            entry.roots = Some(RootWindow::from_parts(w.current, w.recent, window));
            entry.roots_source = Source::Snapshot;
        }
        for (mint, spent) in snapshot.nullifiers {
            let entry = mints.entry(mint.trim().to_string()).or_insert_with(MintLedger::empty);
            entry.nullifiers.merge(spent);
            entry.nullifiers_source = Source::Snapshot;
        }
        info!(mints = mints.len(), "ledger state restored");

        Self {
            window,
            mints: RwLock::new(
                mints
                    .into_iter()
                    .map(|(k, v)| (k, Arc::new(Mutex::new(v))))
                    .collect(),
            ),
            notes: RwLock::new(NoteIndex::from_partitions(snapshot.notes)),
            wallet: RwLock::new(WalletState {
                balances: snapshot.balances,
                activity: snapshot.activity,
                allowances: snapshot.allowances,
            }),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn existing(&self, mint: &str) -> Option<Arc<Mutex<MintLedger>>> {
        self.mints.read().get(mint.trim()).cloned()
    }

    fn entry(&self, mint: &str) -> Result<Arc<Mutex<MintLedger>>, LedgerError> {
        let mint = normalize_mint(mint)?;
        if let Some(found) = self.mints.read().get(&mint) {
            return Ok(found.clone());
        }
        let mut mints = self.mints.write();
        Ok(mints
            .entry(mint)
            .or_insert_with(|| Arc::new(Mutex::new(MintLedger::empty())))
            .clone())
    }

    /// Mints with any root or nullifier state, sorted
    pub fn mints(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.mints.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    // Roots

    pub fn roots(&self, mint: &str) -> Option<RootWindow> {
        self.existing(mint).and_then(|m| m.lock().roots.clone())
    }

    pub fn roots_with_source(&self, mint: &str) -> Option<(RootWindow, Source)> {
        self.existing(mint).and_then(|m| {
            let guard = m.lock();
            guard.roots.clone().map(|r| (r, guard.roots_source))
        })
    }

    /// Validate a claimed prior root against the mint's window.
    pub fn validate_root(&self, mint: &str, claimed: &FieldElement) -> Result<(), LedgerError> {
        let window = self
            .roots(mint)
            .ok_or_else(|| LedgerError::MintNotFound(mint.trim().to_string()))?;
        window.validate(claimed)
    }

    /// Upsert a mint's roots. With an explicit `recent` list the window is
    /// replaced; without one the previous current root is pushed onto it.
    pub fn upsert_roots(
        &self,
        mint: &str,
        current: FieldElement,
        recent: Option<Vec<FieldElement>>,
        source: Source,
    ) -> Result<RootWindow, LedgerError> {
        let entry = self.entry(mint)?;
        let mut guard = entry.lock();
        let window = match (guard.roots.take(), recent) {
            (_, Some(recent)) => RootWindow::from_parts(current, recent, self.window),
            (Some(mut existing), None) => {
                existing.advance(current, self.window);
                existing
            }
            (None, None) => RootWindow::new(current),
        };
        guard.roots = Some(window.clone());
        guard.roots_source = source;
        debug!(mint = mint.trim(), root = %window.current, ?source, "roots updated");
        Ok(window)
    }

    // Nullifiers

    pub fn nullifiers(&self, mint: &str) -> Vec<FieldElement> {
        self.existing(mint)
            .map(|m| m.lock().nullifiers.to_vec())
            .unwrap_or_default()
    }

    pub fn nullifiers_with_source(&self, mint: &str) -> Option<(Vec<FieldElement>, Source)> {
        self.existing(mint).map(|m| {
            let guard = m.lock();
            (guard.nullifiers.to_vec(), guard.nullifiers_source)
        })
    }

    pub fn contains_nullifier(&self, mint: &str, nullifier: &FieldElement) -> bool {
        self.existing(mint)
            .map(|m| m.lock().nullifiers.contains(nullifier))
            .unwrap_or(false)
    }

    /// Entries of `batch` already spent for `mint` or repeated within the batch
    pub fn spent_among(&self, mint: &str, batch: &[FieldElement]) -> Vec<FieldElement> {
        match self.existing(mint) {
            Some(entry) => entry.lock().nullifiers.conflicts(batch),
            None => NullifierSet::new().conflicts(batch),
        }
    }

    /// Atomic insertAll: every nullifier is new and inserted, or none is.
    pub fn insert_all(&self, mint: &str, batch: &[FieldElement]) -> Result<usize, LedgerError> {
        let entry = self.entry(mint)?;
        let mut guard = entry.lock();
        let inserted = guard.nullifiers.insert_all(batch)?;
        guard.nullifiers_source = Source::Cache;
        Ok(inserted)
    }

    /// Idempotent merge; returns the full set afterwards.
    pub fn merge_nullifiers(
        &self,
        mint: &str,
        batch: &[FieldElement],
        source: Source,
    ) -> Result<Vec<FieldElement>, LedgerError> {
        let entry = self.entry(mint)?;
        let mut guard = entry.lock();
        let added = guard.nullifiers.merge(batch.iter().copied());
        guard.nullifiers_source = source;
        debug!(mint = mint.trim(), added, ?source, "nullifiers merged");
        Ok(guard.nullifiers.to_vec())
    }

    /// Read-only consistency check for a spend: the mint must exist, the
    /// claimed root must be in its window and no nullifier may be spent or
    /// repeated. Both checks observe the same state.
    pub fn check_spend(
        &self,
        mint: &str,
        old_root: &FieldElement,
        nullifiers: &[FieldElement],
    ) -> Result<(), LedgerError> {
        let entry = self
            .existing(mint)
            .ok_or_else(|| LedgerError::MintNotFound(mint.trim().to_string()))?;
        let guard = entry.lock();
        let window = guard
            .roots
            .as_ref()
            .ok_or_else(|| LedgerError::MintNotFound(mint.trim().to_string()))?;
        window.validate(old_root)?;
        let duplicates = guard.nullifiers.conflicts(nullifiers);
        if !duplicates.is_empty() {
            return Err(LedgerError::NullifierConflict { duplicates });
        }
        Ok(())
    }

    /// Apply an on-chain state transition under the mint's exclusive section:
    /// validate `old_root` (if given), insert the nullifiers atomically, then
    /// advance to `new_root`. Nothing is applied on failure.
    pub fn apply_transition(
        &self,
        mint: &str,
        old_root: Option<&FieldElement>,
        new_root: FieldElement,
        nullifiers: &[FieldElement],
    ) -> Result<Transition, LedgerError> {
        let mint = normalize_mint(mint)?;
        let entry = match self.existing(&mint) {
            Some(entry) => entry,
            None => {
                // Unknown mint: reject before an entry exists for it.
                if old_root.is_some_and(|root| !root.is_zero()) {
                    return Err(LedgerError::MintNotFound(mint));
                }
                let duplicates = NullifierSet::new().conflicts(nullifiers);
                if !duplicates.is_empty() {
                    return Err(LedgerError::NullifierConflict { duplicates });
                }
                self.entry(&mint)?
            }
        };
        let mut guard = entry.lock();

        if let Some(old_root) = old_root {
            match guard.roots.as_ref() {
                Some(window) => window.validate(old_root)?,
                None if old_root.is_zero() => {}
                None => return Err(LedgerError::MintNotFound(mint)),
            }
        }

        let inserted = guard.nullifiers.insert_all(nullifiers)?;
        let mut window = guard.roots.take().unwrap_or_else(|| RootWindow::new(FieldElement::zero()));
        window.advance(new_root, self.window);
        guard.roots = Some(window.clone());
        guard.roots_source = Source::Cache;
        if inserted > 0 {
            guard.nullifiers_source = Source::Cache;
        }
        info!(mint = %mint, root = %new_root, inserted, "transition applied");
        Ok(Transition {
            roots: window,
            inserted,
        })
    }

    // Notes

    pub fn replace_notes(&self, viewing_key: &str, notes: Vec<Note>) {
        self.notes.write().replace(viewing_key, notes);
    }

    pub fn notes_for(&self, viewing_key: &str) -> Vec<Note> {
        self.notes.read().for_viewing_key(viewing_key)
    }

    pub fn notes_by_mint(&self, mint: &str, query: &NoteQuery) -> NotePage {
        self.notes.read().query_by_mint(mint.trim(), query)
    }

    // Wallet records

    pub fn wallet(&self) -> parking_lot::RwLockReadGuard<'_, WalletState> {
        self.wallet.read()
    }

    pub fn wallet_mut(&self) -> parking_lot::RwLockWriteGuard<'_, WalletState> {
        self.wallet.write()
    }

    /// Capture the full state in persisted layout.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut out = LedgerSnapshot::default();
        for (mint, entry) in self.mints.read().iter() {
            let guard = entry.lock();
            if let Some(roots) = guard.roots.clone() {
                out.roots.insert(mint.clone(), roots);
            }
            if !guard.nullifiers.is_empty() {
                out.nullifiers.insert(mint.clone(), guard.nullifiers.to_vec());
            }
        }
        out.notes = self.notes.read().partitions().clone();
        let wallet = self.wallet.read();
        out.balances = wallet.balances.clone();
        out.activity = wallet.activity.clone();
        out.allowances = wallet.allowances.clone();
        out
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_WINDOW)
    }
}
