//! Configuration for the release mirror
//!
//! The configuration is a plain value built once at startup and handed to the
//! pipeline. Nothing in here reads files or environment variables; that is the
//! job of the binary crate.
//!
//! # Example
//!
//! ```rust
//! use relhook_core::config::{Credential, MirrorConfig, SelectMode};
//!
//! let config = MirrorConfig::new("octocat/hello-world".parse().unwrap(), Credential::new("ghp_xxx"))
//!     .with_mode(SelectMode::Release)
//!     .with_output_dir("/srv/mirror");
//!
//! assert_eq!(config.repository.owner, "octocat");
//! assert!(config.validate().is_ok());
//! ```

mod auth;
mod config;

pub use auth::{Credential, RepositoryRef};
pub use config::{MirrorConfig, SelectMode, DEFAULT_API_BASE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
