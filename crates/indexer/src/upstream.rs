//! Upstream replication
//!
//! The upstream replica serves the same read routes as this service. Fetches
//! always complete before the ledger is touched; results are written back
//! tagged [`Source::Upstream`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shield_core::ledger::{NotePage, NoteQuery, RootWindow};
use shield_core::{FieldElement, LedgerError, LedgerStore, Source};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Read interface of an upstream replica
#[async_trait]
pub trait Replica: Send + Sync {
    /// `None` when the upstream does not know the mint
    async fn roots(&self, mint: &str) -> Result<Option<RootWindow>, UpstreamError>;

    async fn nullifiers(&self, mint: &str) -> Result<Option<Vec<FieldElement>>, UpstreamError>;

    async fn notes_by_mint(&self, mint: &str, query: &NoteQuery) -> Result<Option<NotePage>, UpstreamError>;

    async fn ping(&self) -> bool;
}

#[derive(Deserialize)]
struct NullifierList {
    nullifiers: Vec<FieldElement>,
}

/// Replica reached over HTTP
pub struct HttpReplica {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReplica {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(UpstreamError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Replica for HttpReplica {
    async fn roots(&self, mint: &str) -> Result<Option<RootWindow>, UpstreamError> {
        self.get_json(&format!("/roots/{mint}"), &[]).await
    }

    async fn nullifiers(&self, mint: &str) -> Result<Option<Vec<FieldElement>>, UpstreamError> {
        let list: Option<NullifierList> = self.get_json(&format!("/nullifiers/{mint}"), &[]).await?;
        Ok(list.map(|l| l.nullifiers))
    }

    async fn notes_by_mint(&self, mint: &str, query: &NoteQuery) -> Result<Option<NotePage>, UpstreamError> {
        let mut params = Vec::new();
        if let Some(after) = query.after_slot {
            params.push(("afterSlot", after.to_string()));
        }
        if let Some(tag) = &query.view_tag {
            params.push(("viewTag", tag.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        self.get_json(&format!("/notes/mint/{mint}"), &params).await
    }

    async fn ping(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "upstream ping failed");
                false
            }
        }
    }
}

/// What a refresh actually wrote
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Refreshed {
    pub roots: bool,
    pub nullifiers: bool,
}

/// Copies upstream roots and nullifiers into the local ledger
pub struct Replicator {
    replica: Arc<dyn Replica>,
    ledger: Arc<LedgerStore>,
}

impl Replicator {
    pub fn new(replica: Arc<dyn Replica>, ledger: Arc<LedgerStore>) -> Self {
        Self { replica, ledger }
    }

    pub fn replica(&self) -> &dyn Replica {
        self.replica.as_ref()
    }

    /// Fetch both views, then apply them. Upstream roots replace the local
    /// window; upstream nullifiers are merged, never removed.
    pub async fn refresh(&self, mint: &str) -> Result<Refreshed, UpstreamError> {
        let roots = self.replica.roots(mint).await?;
        let nullifiers = self.replica.nullifiers(mint).await?;

        let mut out = Refreshed::default();
        if let Some(window) = roots {
            self.ledger
                .upsert_roots(mint, window.current, Some(window.recent), Source::Upstream)?;
            out.roots = true;
        }
        if let Some(spent) = nullifiers {
            self.ledger.merge_nullifiers(mint, &spent, Source::Upstream)?;
            out.nullifiers = true;
        }
        Ok(out)
    }

    /// Refresh every locally known mint; returns how many succeeded.
    pub async fn refresh_all(&self) -> usize {
        let mut refreshed = 0;
        for mint in self.ledger.mints() {
            match self.refresh(&mint).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(mint = %mint, error = %e, "upstream refresh failed"),
            }
        }
        refreshed
    }

    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!(interval_secs = interval.as_secs(), "starting upstream poller");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let refreshed = self.refresh_all().await;
                debug!(refreshed, "upstream poll complete");
            }
        })
    }
}
