//! Service configuration
//!
//! Command line flags with `LEDGER_*` environment fallbacks. A `.env` file in
//! the working directory is loaded before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use shield_core::ledger::DEFAULT_ROOT_WINDOW;
use shield_core::FEE_BPS_DEFAULT;

#[derive(Parser, Debug, Clone)]
#[command(name = "shield-indexer")]
#[command(about = "Ledger, sync and proving service for shielded pools")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LEDGER_BIND", default_value = "0.0.0.0:8787")]
    pub bind: SocketAddr,

    /// Snapshot read at startup and written on shutdown
    #[arg(long, env = "LEDGER_SNAPSHOT_PATH", default_value = "data/ledger-snapshot.json")]
    pub snapshot_path: PathBuf,

    /// Fixture loaded when no snapshot exists
    #[arg(long, env = "LEDGER_FIXTURE_PATH")]
    pub fixture_path: Option<PathBuf>,

    /// Superseded roots kept per mint
    #[arg(long, env = "LEDGER_ROOT_WINDOW", default_value_t = DEFAULT_ROOT_WINDOW)]
    pub root_window: usize,

    /// Upstream replica base URL
    #[arg(long, env = "LEDGER_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Upstream request timeout in milliseconds
    #[arg(long, env = "LEDGER_UPSTREAM_TIMEOUT_MS", default_value_t = 3000)]
    pub upstream_timeout_ms: u64,

    /// Seconds between background refreshes (0 disables polling)
    #[arg(long, env = "LEDGER_UPSTREAM_POLL_SECS", default_value_t = 0)]
    pub upstream_poll_secs: u64,

    /// Shared secret required as bearer token or `x-api-key`
    #[arg(long, env = "LEDGER_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Directory holding `<circuit>.zkey` and `<circuit>_vk.json`
    #[arg(long, env = "LEDGER_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// External proving backend, run as `<cmd> <circuit> <zkey>`
    #[arg(long, env = "LEDGER_PROVER_CMD")]
    pub prover_cmd: Option<PathBuf>,

    /// Prover timeout in seconds
    #[arg(long, env = "LEDGER_PROVER_TIMEOUT_SECS", default_value_t = 120)]
    pub prover_timeout_secs: u64,

    /// Surface prover failures instead of serving mock transcripts
    #[arg(long, env = "LEDGER_NO_MOCK_FALLBACK")]
    pub no_mock_fallback: bool,

    /// Prove without consulting the ledger
    #[arg(long, env = "LEDGER_STANDALONE")]
    pub standalone: bool,

    /// Mint registry JSON
    #[arg(long, env = "LEDGER_MINT_REGISTRY")]
    pub mint_registry: Option<PathBuf>,

    /// Unshield fee for unregistered mints, in basis points
    #[arg(long, env = "LEDGER_FEE_BPS", default_value_t = FEE_BPS_DEFAULT)]
    pub fee_bps: u16,
}

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.upstream_poll_secs > 0).then(|| Duration::from_secs(self.upstream_poll_secs))
    }

    pub fn prover_timeout(&self) -> Duration {
        Duration::from_secs(self.prover_timeout_secs)
    }

    /// Empty tokens count as unset
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}
