//! HTTP client for the GitHub REST API

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpError, ACCEPT_GITHUB_JSON, ACCEPT_OCTET_STREAM, DEFAULT_USER_AGENT, GITHUB_API_VERSION};
