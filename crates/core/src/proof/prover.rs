//! Prover capability
//!
//! Proving itself is external. A [`Prover`] is chosen per circuit once at
//! startup: [`CommandProver`] when the circuit's proving and verifying keys
//! exist and a backend command is configured, [`MockProver`] otherwise.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{CircuitKind, ProofMode, PROOF_SIZE};
use crate::crypto::FieldElement;
use crate::error::ProofError;

const MOCK_DOMAIN: &[u8] = b"shield-ledger/mock-proof/v1";

/// Everything a prover sees for one request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverRequest {
    pub circuit: CircuitKind,
    pub payload: Value,
    pub public_inputs: Vec<FieldElement>,
    pub verifying_key_hash: String,
}

#[async_trait]
pub trait Prover: Send + Sync {
    fn mode(&self) -> ProofMode;

    /// Produce proof bytes for `request`
    async fn prove(&self, request: &ProverRequest) -> Result<Vec<u8>, ProofError>;
}

/// Deterministic stand-in: a BLAKE3 XOF transcript over the circuit, the
/// payload (keys sorted) and the verifying-key hash. Never a valid proof.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockProver;

impl MockProver {
    pub fn transcript(request: &ProverRequest) -> Result<Vec<u8>, ProofError> {
        let payload = serde_json::to_vec(&request.payload)
            .map_err(|e| ProofError::ProverFailure(format!("payload encoding: {e}")))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(MOCK_DOMAIN);
        hasher.update(&[0]);
        hasher.update(request.circuit.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(&(payload.len() as u64).to_le_bytes());
        hasher.update(&payload);
        hasher.update(request.verifying_key_hash.as_bytes());

        let mut out = vec![0u8; PROOF_SIZE];
        hasher.finalize_xof().fill(&mut out);
        Ok(out)
    }
}

#[async_trait]
impl Prover for MockProver {
    fn mode(&self) -> ProofMode {
        ProofMode::Mock
    }

    async fn prove(&self, request: &ProverRequest) -> Result<Vec<u8>, ProofError> {
        Self::transcript(request)
    }
}

/// External proving backend run as `<command> <circuit> <proving-key>`.
/// The request goes in as JSON on stdin; stdout is either
/// `{"proof": "0x.."}` or bare hex. The child is killed on timeout.
#[derive(Clone, Debug)]
pub struct CommandProver {
    command: PathBuf,
    proving_key: PathBuf,
    timeout: Duration,
}

impl CommandProver {
    pub fn new(command: impl Into<PathBuf>, proving_key: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            proving_key: proving_key.into(),
            timeout,
        }
    }

    async fn run(&self, request: &ProverRequest) -> Result<Vec<u8>, ProofError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| ProofError::ProverFailure(format!("request encoding: {e}")))?;

        let mut child = Command::new(&self.command)
            .arg(request.circuit.as_str())
            .arg(&self.proving_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProofError::ProverFailure(format!("spawn {}: {e}", self.command.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|e| ProofError::ProverFailure(format!("stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProofError::ProverFailure(format!("wait: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProofError::ProverFailure(format!(
                "backend exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        parse_proof_output(&output.stdout)
    }
}

fn parse_proof_output(stdout: &[u8]) -> Result<Vec<u8>, ProofError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    let hex_str = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => obj
            .get("proof")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProofError::ProverFailure("backend output has no proof".into()))?,
        _ => text.to_string(),
    };
    let hex_str = hex_str.trim_start_matches("0x");
    let bytes = hex::decode(hex_str)
        .map_err(|e| ProofError::ProverFailure(format!("backend proof is not hex: {e}")))?;
    if bytes.is_empty() {
        return Err(ProofError::ProverFailure("backend returned an empty proof".into()));
    }
    Ok(bytes)
}

#[async_trait]
impl Prover for CommandProver {
    fn mode(&self) -> ProofMode {
        ProofMode::Groth16
    }

    async fn prove(&self, request: &ProverRequest) -> Result<Vec<u8>, ProofError> {
        match tokio::time::timeout(self.timeout, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProofError::ProverTimeout(self.timeout)),
        }
    }
}

/// Proving artifacts found for one circuit
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitArtifacts {
    pub proving_key: Option<PathBuf>,
    pub verifying_key: Option<PathBuf>,
    pub verifying_key_hash: String,
}

impl CircuitArtifacts {
    /// Both keys present
    pub fn is_real(&self) -> bool {
        self.proving_key.is_some() && self.verifying_key.is_some()
    }
}

/// Verifying-key cache: `<dir>/<circuit>.zkey` and `<dir>/<circuit>_vk.json`
#[derive(Clone, Debug)]
pub struct ArtifactCatalog {
    dir: PathBuf,
    circuits: BTreeMap<CircuitKind, CircuitArtifacts>,
}

fn sha256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(Sha256::digest(data)))
}

impl ArtifactCatalog {
    pub fn load(dir: &Path) -> Self {
        let mut circuits = BTreeMap::new();
        for circuit in CircuitKind::ALL {
            let zkey = dir.join(format!("{}.zkey", circuit.as_str()));
            let vk = dir.join(format!("{}_vk.json", circuit.as_str()));

            let proving_key = zkey.is_file().then_some(zkey);
            let (verifying_key, verifying_key_hash) = match std::fs::read(&vk) {
                Ok(bytes) => (Some(vk), sha256_hex(&bytes)),
                Err(_) => (None, sha256_hex(format!("mock-vk:{}", circuit.as_str()).as_bytes())),
            };
            let artifacts = CircuitArtifacts {
                proving_key,
                verifying_key,
                verifying_key_hash,
            };
            debug!(circuit = %circuit, real = artifacts.is_real(), "artifacts scanned");
            circuits.insert(circuit, artifacts);
        }
        Self {
            dir: dir.to_path_buf(),
            circuits,
        }
    }

    /// Catalog with no artifacts at all
    pub fn empty() -> Self {
        let circuits = CircuitKind::ALL
            .into_iter()
            .map(|circuit| {
                let artifacts = CircuitArtifacts {
                    proving_key: None,
                    verifying_key: None,
                    verifying_key_hash: sha256_hex(format!("mock-vk:{}", circuit.as_str()).as_bytes()),
                };
                (circuit, artifacts)
            })
            .collect();
        Self {
            dir: PathBuf::new(),
            circuits,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, circuit: CircuitKind) -> Option<&CircuitArtifacts> {
        self.circuits.get(&circuit)
    }

    pub fn verifying_key_hash(&self, circuit: CircuitKind) -> String {
        self.get(circuit)
            .map(|a| a.verifying_key_hash.clone())
            .unwrap_or_else(|| sha256_hex(format!("mock-vk:{}", circuit.as_str()).as_bytes()))
    }
}

/// Prover selected per circuit
pub struct ProverSet {
    catalog: ArtifactCatalog,
    provers: BTreeMap<CircuitKind, Arc<dyn Prover>>,
}

impl ProverSet {
    /// Select a real prover for each circuit that has both keys, when a
    /// backend command is configured.
    pub fn select(catalog: ArtifactCatalog, command: Option<&Path>, timeout: Duration) -> Self {
        let mut provers: BTreeMap<CircuitKind, Arc<dyn Prover>> = BTreeMap::new();
        for circuit in CircuitKind::ALL {
            let prover: Arc<dyn Prover> = match (command, catalog.get(circuit)) {
                (Some(cmd), Some(artifacts)) if artifacts.is_real() => {
                    let pk = artifacts.proving_key.clone().unwrap_or_default();
                    Arc::new(CommandProver::new(cmd, pk, timeout))
                }
                _ => Arc::new(MockProver),
            };
            info!(circuit = %circuit, mode = ?prover.mode(), "prover selected");
            provers.insert(circuit, prover);
        }
        Self { catalog, provers }
    }

    /// Mock for every circuit
    pub fn mock_only() -> Self {
        Self::select(ArtifactCatalog::empty(), None, Duration::from_secs(1))
    }

    /// Override the prover of one circuit
    pub fn with_prover(mut self, circuit: CircuitKind, prover: Arc<dyn Prover>) -> Self {
        self.provers.insert(circuit, prover);
        self
    }

    pub fn prover(&self, circuit: CircuitKind) -> Arc<dyn Prover> {
        self.provers
            .get(&circuit)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockProver))
    }

    pub fn catalog(&self) -> &ArtifactCatalog {
        &self.catalog
    }

    pub fn mode(&self, circuit: CircuitKind) -> ProofMode {
        self.prover(circuit).mode()
    }
}
