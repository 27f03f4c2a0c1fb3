//! Mirror configuration value

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::auth::{Credential, RepositoryRef};
use crate::error::{MirrorError, Result};
use crate::http::DEFAULT_USER_AGENT;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What the selector turns a release into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// One target per release asset
    #[default]
    Assets,
    /// A single target for the release source archive
    Release,
}

impl SelectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectMode::Assets => "assets",
            SelectMode::Release => "release",
        }
    }
}

impl FromStr for SelectMode {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "assets" | "asset" => Ok(SelectMode::Assets),
            "release" => Ok(SelectMode::Release),
            other => Err(MirrorError::Config(format!(
                "Unknown mode '{}', expected 'assets' or 'release'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub repository: RepositoryRef,
    pub credential: Credential,
    pub mode: SelectMode,
    /// Resolve and list targets without transferring any bytes
    pub report_only: bool,
    pub api_base: String,
    pub output_dir: PathBuf,
    pub user_agent: String,
    /// Longest wait for the next byte of a response; a transfer that keeps
    /// moving is never cut off
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// `None` dispatches every fetch at once
    pub max_concurrent: Option<usize>,
    /// Answer the webhook with HTTP 200 even when the pipeline failed
    pub always_ok_status: bool,
}

impl MirrorConfig {
    pub fn new(repository: RepositoryRef, credential: Credential) -> Self {
        Self {
            repository,
            credential,
            mode: SelectMode::default(),
            report_only: false,
            api_base: DEFAULT_API_BASE.to_string(),
            output_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_concurrent: None,
            always_ok_status: true,
        }
    }

    pub fn with_mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_report_only(mut self, report_only: bool) -> Self {
        self.report_only = report_only;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl AsRef<Path>) -> Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_always_ok_status(mut self, always_ok_status: bool) -> Self {
        self.always_ok_status = always_ok_status;
        self
    }

    /// Check the values that cannot be checked by the type system
    pub fn validate(&self) -> Result<()> {
        if self.credential.is_empty() {
            return Err(MirrorError::Config("GitHub token is empty".to_string()));
        }

        let base = url::Url::parse(&self.api_base).map_err(|e| {
            MirrorError::Config(format!("Invalid API base URL '{}': {}", self.api_base, e))
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(MirrorError::Config(format!(
                "API base URL must be http or https, got '{}'",
                base.scheme()
            )));
        }

        if self.max_concurrent == Some(0) {
            return Err(MirrorError::Config("max_concurrent must be at least 1".to_string()));
        }

        Ok(())
    }

    /// `GET /repos/{owner}/{repo}/releases/latest`
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.repository.owner,
            self.repository.name
        )
    }

    /// `GET /repos/{owner}/{repo}/releases/assets/{id}`
    pub fn asset_url(&self, asset_id: u64) -> String {
        format!(
            "{}/repos/{}/{}/releases/assets/{}",
            self.api_base.trim_end_matches('/'),
            self.repository.owner,
            self.repository.name,
            asset_id
        )
    }
}
