use std::sync::Arc;

use super::model::ReleaseDescriptor;
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::http::{HttpClient, ACCEPT_GITHUB_JSON};

/// Looks up the newest published release of the configured repository
pub struct ReleaseClient {
    http: Arc<HttpClient>,
    config: Arc<MirrorConfig>,
}

impl ReleaseClient {
    pub fn new(http: Arc<HttpClient>, config: Arc<MirrorConfig>) -> Self {
        Self { http, config }
    }

    /// Fetch and decode `releases/latest`
    pub async fn fetch_latest(&self) -> Result<ReleaseDescriptor> {
        let url = self.config.latest_release_url();
        log::info!("Looking up latest release of {}", self.config.repository);

        let response = self.http.get(&url, ACCEPT_GITHUB_JSON).await?;
        let body = response.text().await?;

        let release = ReleaseDescriptor::from_json(&body)?;
        log::info!(
            "Latest release of {} is {} ({} assets)",
            self.config.repository,
            release.label(),
            release.assets.len()
        );

        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credential, RepositoryRef};
    use crate::error::MirrorError;
    use httpmock::prelude::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ReleaseClient {
        let config = Arc::new(
            MirrorConfig::new(RepositoryRef::new("octocat", "hello-world"), Credential::new("gho_token"))
                .with_api_base(server.base_url()),
        );
        let http = Arc::new(HttpClient::from_mirror_config(&config).unwrap());
        ReleaseClient::new(http, config)
    }

    #[tokio::test]
    async fn test_fetch_latest() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octocat/hello-world/releases/latest")
                    .header("accept", "application/vnd.github+json")
                    .header("x-github-api-version", "2022-11-28")
                    .header("authorization", "Bearer gho_token");
                then.status(200).json_body(json!({
                    "id": 99,
                    "tag_name": "v2.0.0",
                    "zipball_url": "https://api.github.com/repos/octocat/hello-world/zipball/v2.0.0",
                    "prerelease": false,
                    "assets": [
                        { "id": 1, "name": "a.tar.gz", "browser_download_url": "https://example.com/a.tar.gz" }
                    ]
                }));
            })
            .await;

        let release = client_for(&server).fetch_latest().await.unwrap();

        mock.assert_async().await;
        assert_eq!(release.id, 99);
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].browser_download_url, "https://example.com/a.tar.gz");
    }

    #[tokio::test]
    async fn test_fetch_latest_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/hello-world/releases/latest");
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;

        let result = client_for(&server).fetch_latest().await;

        match result {
            Err(MirrorError::Upstream { status }) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_latest_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/hello-world/releases/latest");
                then.status(200).json_body(json!({ "id": 1, "assets": "none" }));
            })
            .await;

        let result = client_for(&server).fetch_latest().await;
        assert!(matches!(result, Err(MirrorError::Decode(_))));
    }
}
