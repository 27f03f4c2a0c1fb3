pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod release;
pub mod selector;
pub mod webhook;

pub use config::{Credential, MirrorConfig, RepositoryRef, SelectMode};
pub use downloader::{AssetFetcher, DownloadCoordinator, FetchOutcome, Fetcher};
pub use error::{MirrorError, Result};
pub use http::{HttpClient, HttpClientConfig, HttpError};
pub use release::{AssetDescriptor, ReleaseClient, ReleaseDescriptor};
pub use selector::{select_targets, FetchTarget};
pub use webhook::{summarize, HookResponse, WebhookHandler};
