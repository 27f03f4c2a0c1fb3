//! Typed view of the GitHub release object.
//!
//! Only the fields the mirror uses are modelled; everything else in the
//! payload is ignored. A payload missing a required field fails to decode.

use serde::Deserialize;

use crate::error::{MirrorError, Result};

/// GitHub release metadata
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub id: u64,
    #[serde(default)]
    pub tag_name: Option<String>,
    /// Source archive of the tagged commit
    pub zipball_url: String,
    pub assets: Vec<AssetDescriptor>,
}

/// GitHub release asset
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// API download URL (`/releases/assets/{id}`)
    #[serde(default)]
    pub url: Option<String>,
    pub browser_download_url: String,
}

impl ReleaseDescriptor {
    /// Decode a release from the raw response body
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| MirrorError::Decode(e.to_string()))
    }

    /// Tag name if present, release id otherwise
    pub fn label(&self) -> String {
        match &self.tag_name {
            Some(tag) => tag.clone(),
            None => self.id.to_string(),
        }
    }
}
