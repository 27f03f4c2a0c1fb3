//! Single-target download to local storage.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Response;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::disposition::parse_filename;
use crate::config::MirrorConfig;
use crate::error::{MirrorError, Result};
use crate::http::{HttpClient, ACCEPT_OCTET_STREAM};
use crate::selector::FetchTarget;

/// Terminal result of one fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub target: FetchTarget,
    /// Bytes actually persisted to `destination`
    pub bytes_written: u64,
    pub destination: Option<PathBuf>,
    pub error: Option<MirrorError>,
}

impl FetchOutcome {
    pub fn completed(target: FetchTarget, destination: PathBuf, bytes_written: u64) -> Self {
        Self {
            target,
            bytes_written,
            destination: Some(destination),
            error: None,
        }
    }

    /// Outcome of a target that was only listed, never downloaded
    pub fn reported(target: FetchTarget) -> Self {
        Self {
            target,
            bytes_written: 0,
            destination: None,
            error: None,
        }
    }

    pub fn failed(target: FetchTarget, error: MirrorError) -> Self {
        Self {
            target,
            bytes_written: 0,
            destination: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Something that can turn a target into an outcome.
///
/// Implementations must always return; failures are reported inside the
/// outcome, never by panicking or dropping the target.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: FetchTarget) -> FetchOutcome;
}

/// Downloads release assets and archives from GitHub
pub struct AssetFetcher {
    http: Arc<HttpClient>,
    config: Arc<MirrorConfig>,
}

impl AssetFetcher {
    pub fn new(http: Arc<HttpClient>, config: Arc<MirrorConfig>) -> Self {
        Self { http, config }
    }

    /// The URL the binary content is requested from
    pub fn download_url(&self, target: &FetchTarget) -> String {
        match target {
            FetchTarget::Asset { id, .. } => self.config.asset_url(*id),
            FetchTarget::ReleaseArchive { archive_url, .. } => archive_url.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for AssetFetcher {
    async fn fetch(&self, target: FetchTarget) -> FetchOutcome {
        let url = self.download_url(&target);
        log::info!("Download: {}", url);

        let response = match self.http.get(&url, ACCEPT_OCTET_STREAM).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Failed to download {}: {}", target, e);
                return FetchOutcome::failed(target, e.into());
            }
        };

        let filename = match destination_filename(&response) {
            Ok(name) => name,
            Err(e) => {
                log::warn!("Failed to download {}: {}", target, e);
                return FetchOutcome::failed(target, e);
            }
        };

        let destination = self.config.output_dir.join(&filename);
        let mut file = match open_destination(&destination).await {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Cannot create {}: {}", destination.display(), e);
                return FetchOutcome::failed(target, e.into());
            }
        };

        let (written, streamed) = stream_body(response, &mut file).await;
        let flushed = file.flush().await.map_err(MirrorError::from);
        drop(file);

        match streamed.and(flushed) {
            Ok(()) => {
                log::info!("Download finished: {} -> {} ({} bytes)", url, destination.display(), written);
                FetchOutcome::completed(target, destination, written)
            }
            Err(e) => {
                // Partial file stays on disk; report what actually landed there
                let persisted = tokio::fs::metadata(&destination)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(written);
                log::warn!(
                    "Download of {} interrupted after {} bytes, partial file left at {}: {}",
                    target,
                    persisted,
                    destination.display(),
                    e
                );
                FetchOutcome {
                    target,
                    bytes_written: persisted,
                    destination: Some(destination),
                    error: Some(e),
                }
            }
        }
    }
}

fn destination_filename(response: &Response) -> Result<String> {
    let header = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .ok_or_else(|| MirrorError::Metadata("response has no Content-Disposition header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| MirrorError::Metadata("Content-Disposition is not valid text".to_string()))?;

    parse_filename(value)
}

/// Create (or truncate) the destination file
async fn open_destination(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o664);

    options.open(path).await
}

/// Copy the response body into `file` chunk by chunk.
///
/// Returns the number of bytes handed to the file along with the first error.
async fn stream_body(response: Response, file: &mut File) -> (u64, Result<()>) {
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return (written, Err(MirrorError::Io(std::io::Error::other(e)))),
        };

        if let Err(e) = file.write_all(&chunk).await {
            return (written, Err(e.into()));
        }
        written += chunk.len() as u64;
    }

    (written, Ok(()))
}
