//! Release mirror pipeline behind the webhook.
//!
//! Release lookup, target selection and the download fan-out, reduced to a
//! `{code, msg}` status payload for the caller.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::MirrorConfig;
use crate::downloader::{AssetFetcher, DownloadCoordinator, FetchOutcome};
use crate::error::{MirrorError, Result};
use crate::http::HttpClient;
use crate::release::ReleaseClient;
use crate::selector::select_targets;

pub const CODE_OK: u16 = 200;
pub const CODE_FAILURE: u16 = 500;

/// Status payload returned by the hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    pub code: u16,
    pub msg: String,
}

impl HookResponse {
    pub fn ok() -> Self {
        Self {
            code: CODE_OK,
            msg: "OK".to_string(),
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_FAILURE,
            msg: msg.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// HTTP status to answer with
    pub fn http_status(&self, always_ok: bool) -> u16 {
        if always_ok {
            CODE_OK
        } else {
            self.code
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Reduce a set of outcomes to a status payload
pub fn summarize(outcomes: &[FetchOutcome]) -> HookResponse {
    let failures: Vec<String> = outcomes
        .iter()
        .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {}", o.target, e)))
        .collect();

    if failures.is_empty() {
        return HookResponse::ok();
    }

    HookResponse::failure(format!(
        "{} of {} downloads failed: {}",
        failures.len(),
        outcomes.len(),
        failures.join("; ")
    ))
}

pub struct WebhookHandler {
    config: Arc<MirrorConfig>,
    releases: ReleaseClient,
    coordinator: DownloadCoordinator,
}

impl WebhookHandler {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let http = Arc::new(HttpClient::from_mirror_config(&config)?);
        let fetcher = Arc::new(AssetFetcher::new(Arc::clone(&http), Arc::clone(&config)));

        Ok(Self {
            releases: ReleaseClient::new(http, Arc::clone(&config)),
            coordinator: DownloadCoordinator::new(fetcher).with_max_concurrent(config.max_concurrent),
            config,
        })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Look up the latest release and fetch (or list) its targets.
    ///
    /// A failed release lookup is the only error; per-target failures are in the
    /// returned outcomes.
    pub async fn run(&self) -> Result<Vec<FetchOutcome>> {
        let release = self.releases.fetch_latest().await?;
        let targets = select_targets(&release, self.config.mode);

        if targets.is_empty() {
            log::info!("Release {} has no assets, nothing to fetch", release.label());
        }

        Ok(self.coordinator.run_all(targets, self.config.report_only).await)
    }

    /// Run the pipeline once and report the result as a status payload
    pub async fn handle(&self) -> HookResponse {
        match self.run().await {
            Ok(outcomes) => summarize(&outcomes),
            Err(e) => {
                log::error!("Release lookup for {} failed: {}", self.config.repository, e);
                HookResponse::failure(failure_message(&e))
            }
        }
    }
}

fn failure_message(err: &MirrorError) -> String {
    match err {
        // Status line only, e.g. "403 Forbidden"
        MirrorError::Upstream { status } => status.to_string(),
        other => other.to_string(),
    }
}
