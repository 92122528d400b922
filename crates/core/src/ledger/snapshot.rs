//! JSON snapshot persistence
//!
//! The whole ledger is a single JSON document read once at startup and
//! written on graceful shutdown. Writes go to a sibling temp file that is
//! renamed over the target. There is no write-ahead log: a crash loses
//! everything since the last flush.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::notes::Note;
use super::roots::RootWindow;
use super::wallet::{ActivityEntry, Allowance};
use crate::crypto::FieldElement;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted layout
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub roots: BTreeMap<String, RootWindow>,
    #[serde(default)]
    pub nullifiers: BTreeMap<String, Vec<FieldElement>>,
    #[serde(default)]
    pub notes: BTreeMap<String, Vec<Note>>,
    #[serde(default)]
    pub balances: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub activity: BTreeMap<String, Vec<ActivityEntry>>,
    #[serde(default)]
    pub allowances: BTreeMap<String, Allowance>,
}

/// Where the initial state came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Snapshot(PathBuf),
    Fixture(PathBuf),
    Empty,
}

impl LedgerSnapshot {
    /// Read a snapshot, returning `None` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SnapshotError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Load the snapshot if present, else the fixture, else an empty ledger.
    pub fn load(snapshot: &Path, fixture: Option<&Path>) -> Result<(Self, SnapshotOrigin), SnapshotError> {
        if let Some(state) = Self::read(snapshot)? {
            return Ok((state, SnapshotOrigin::Snapshot(snapshot.to_path_buf())));
        }
        if let Some(fixture) = fixture {
            if let Some(state) = Self::read(fixture)? {
                return Ok((state, SnapshotOrigin::Fixture(fixture.to_path_buf())));
            }
        }
        Ok((Self::default(), SnapshotOrigin::Empty))
    }

    pub fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        let encoded = serde_json::to_vec_pretty(self)?;
        let write_err = |source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, encoded).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }
}
