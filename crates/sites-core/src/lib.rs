//! Sites Core Library
//!
//! This crate provides shared identifiers, errors, configuration and logging
//! setup for the sites reducer and its tools.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{ReducerConfig, SitesConfig};
pub use error::{SitesError, SitesResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use types::{FolderId, PartitionNumber, SiteKey, SiteTag, Timestamp};
