//! Release asset downloading.
//!
//! [`AssetFetcher`] turns one [`FetchTarget`](crate::FetchTarget) into one file
//! on disk. [`DownloadCoordinator`] fans a list of targets out to concurrent
//! fetches and collects exactly one [`FetchOutcome`] per target.

mod coordinator;
mod disposition;
mod fetcher;

pub use coordinator::DownloadCoordinator;
pub use disposition::parse_filename;
pub use fetcher::{AssetFetcher, FetchOutcome, Fetcher};
