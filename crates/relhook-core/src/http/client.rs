//! HTTP client for GitHub release operations.
//!
//! This module wraps `reqwest` with the header set the GitHub REST API expects:
//! - `X-GitHub-Api-Version` pinned to a dated API version
//! - bearer authentication from the configured [`Credential`]
//! - a caller-chosen `Accept` media type (JSON metadata or raw octet stream)
//!
//! Every request is a single attempt. Non-2xx answers are turned into
//! [`HttpError::HttpStatus`] before the body is read.
//!
//! # Examples
//!
//! ```no_run
//! use relhook_core::http::{HttpClient, HttpClientConfig, ACCEPT_GITHUB_JSON};
//! use relhook_core::Credential;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new().with_read_timeout(Duration::from_secs(60));
//! let client = HttpClient::with_config(config)?.with_credential(Credential::new("ghp_xxx"));
//!
//! let response = client
//!     .get("https://api.github.com/repos/octocat/hello-world/releases/latest", ACCEPT_GITHUB_JSON)
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::config::{Credential, MirrorConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};

pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
pub const ACCEPT_OCTET_STREAM: &str = "application/octet-stream";

pub const DEFAULT_USER_AGENT: &str = concat!("relhook/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: StatusCode, url: String },
}

pub struct HttpClient {
    client: Client,
    credential: Option<Credential>,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .read_timeout(config.read_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            credential: None,
        })
    }

    /// Build a client from the mirror configuration, credential included
    pub fn from_mirror_config(config: &MirrorConfig) -> Result<Self, reqwest::Error> {
        let http_config = HttpClientConfig::new()
            .with_read_timeout(config.read_timeout)
            .with_connect_timeout(config.connect_timeout)
            .with_user_agent(config.user_agent.clone());

        Ok(Self::with_config(http_config)?.with_credential(config.credential.clone()))
    }

    /// Set the bearer token sent with every request
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Perform a GET request and reject non-2xx answers
    pub async fn get(&self, url: &str, accept: &str) -> Result<Response, HttpError> {
        log::debug!("HTTP GET {} ({})", url, accept);

        let response = self.execute_get(url, accept).await?;
        let status = response.status();

        log::debug!("HTTP {} {}", status.as_u16(), url);

        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    async fn execute_get(&self, url: &str, accept: &str) -> Result<Response, HttpError> {
        let mut request = self
            .client
            .get(url)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::ACCEPT, accept);

        if let Some(ref credential) = self.credential {
            request = request.bearer_auth(credential.expose());
        }

        Ok(request.send().await?)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}
