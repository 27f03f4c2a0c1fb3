//! Turns a release into the list of things to fetch.

use std::fmt;

use crate::config::SelectMode;
use crate::release::ReleaseDescriptor;

/// One unit of download work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// A release asset, downloaded through `releases/assets/{id}`
    Asset {
        id: u64,
        name: Option<String>,
        browser_url: String,
    },
    /// The source archive of a release
    ReleaseArchive { id: u64, archive_url: String },
}

impl FetchTarget {
    pub fn id(&self) -> u64 {
        match self {
            FetchTarget::Asset { id, .. } | FetchTarget::ReleaseArchive { id, .. } => *id,
        }
    }

    /// Human-facing location, used in report-only mode
    pub fn location(&self) -> &str {
        match self {
            FetchTarget::Asset { browser_url, .. } => browser_url,
            FetchTarget::ReleaseArchive { archive_url, .. } => archive_url,
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Asset { id, name: Some(name), .. } => write!(f, "asset {} ({})", id, name),
            FetchTarget::Asset { id, name: None, .. } => write!(f, "asset {}", id),
            FetchTarget::ReleaseArchive { id, .. } => write!(f, "release {} archive", id),
        }
    }
}

/// Build the fetch targets for a release, preserving asset order.
///
/// An asset-mode release without assets yields no targets.
pub fn select_targets(release: &ReleaseDescriptor, mode: SelectMode) -> Vec<FetchTarget> {
    match mode {
        SelectMode::Release => vec![FetchTarget::ReleaseArchive {
            id: release.id,
            archive_url: release.zipball_url.clone(),
        }],
        SelectMode::Assets => release
            .assets
            .iter()
            .map(|asset| FetchTarget::Asset {
                id: asset.id,
                name: asset.name.clone(),
                browser_url: asset.browser_download_url.clone(),
            })
            .collect(),
    }
}
