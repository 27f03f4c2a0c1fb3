//! GitHub release lookup.

mod client;
mod model;

pub use client::ReleaseClient;
pub use model::{AssetDescriptor, ReleaseDescriptor};
