//! Mint registry
//!
//! Process-scoped catalog of known mints loaded once at startup. Registered
//! mints carry a fee override, a status and feature flags; mints missing from
//! the registry are unrestricted and use the configured default fee.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::FieldElement;

/// Default unshield fee in basis points
pub const FEE_BPS_DEFAULT: u16 = 5;
/// Basis point denominator
pub const MAX_BPS: u16 = 10_000;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read registry {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed registry {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("fee of {fee_bps} bps for {mint} exceeds 10000")]
    FeeTooHigh { mint: String, fee_bps: u16 },
    #[error("duplicate mint {0}")]
    Duplicate(String),
    #[error("empty mint key")]
    EmptyMint,
}

/// Pool feature bit field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags(u8);

impl FeatureFlags {
    pub const PRIVATE_TRANSFER: FeatureFlags = FeatureFlags(0x01);
    pub const HOOKS: FeatureFlags = FeatureFlags(0x02);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: FeatureFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FeatureFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FeatureFlags) {
        self.0 &= !other.0;
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::PRIVATE_TRANSFER) {
            names.push("private_transfer");
        }
        if self.contains(Self::HOOKS) {
            names.push("hooks");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

fn default_features() -> FeatureFlags {
    FeatureFlags::PRIVATE_TRANSFER
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintStatus {
    #[default]
    Active,
    Frozen,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintConfig {
    pub mint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<FieldElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint_id: Option<FieldElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<u16>,
    #[serde(default)]
    pub status: MintStatus,
    #[serde(default = "default_features")]
    pub features: FeatureFlags,
}

impl MintConfig {
    pub fn is_frozen(&self) -> bool {
        self.status == MintStatus::Frozen
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    mints: Vec<MintConfig>,
}

#[derive(Clone, Debug)]
pub struct MintRegistry {
    mints: BTreeMap<String, MintConfig>,
    default_fee_bps: u16,
}

impl MintRegistry {
    pub fn empty(default_fee_bps: u16) -> Self {
        Self {
            mints: BTreeMap::new(),
            default_fee_bps,
        }
    }

    pub fn from_configs(configs: Vec<MintConfig>, default_fee_bps: u16) -> Result<Self, RegistryError> {
        let mut mints = BTreeMap::new();
        for mut config in configs {
            config.mint = config.mint.trim().to_string();
            if config.mint.is_empty() {
                return Err(RegistryError::EmptyMint);
            }
            if let Some(fee_bps) = config.fee_bps.filter(|f| *f > MAX_BPS) {
                return Err(RegistryError::FeeTooHigh {
                    mint: config.mint,
                    fee_bps,
                });
            }
            if mints.contains_key(&config.mint) {
                return Err(RegistryError::Duplicate(config.mint));
            }
            mints.insert(config.mint.clone(), config);
        }
        Ok(Self {
            mints,
            default_fee_bps,
        })
    }

    pub fn load(path: &Path, default_fee_bps: u16) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RegistryFile = serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_configs(file.mints, default_fee_bps)
    }

    pub fn get(&self, mint: &str) -> Option<&MintConfig> {
        self.mints.get(mint.trim())
    }

    pub fn list(&self) -> Vec<MintConfig> {
        self.mints.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mints.is_empty()
    }

    pub fn fee_bps(&self, mint: &str) -> u16 {
        self.get(mint)
            .and_then(|c| c.fee_bps)
            .unwrap_or(self.default_fee_bps)
    }

    pub fn default_fee_bps(&self) -> u16 {
        self.default_fee_bps
    }
}

/// `floor(amount * fee_bps / 10_000)` without overflow
pub fn calculate_fee(amount: u64, fee_bps: u16) -> u64 {
    let numerator = amount as u128 * fee_bps as u128;
    (numerator / MAX_BPS as u128) as u64
}
