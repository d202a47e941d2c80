//! Error types for the sites crates

use crate::types::{FolderId, SiteKey};
use thiserror::Error;

/// Result type alias for sites operations
pub type SitesResult<T> = Result<T, SitesError>;

/// Main error type for the sites crates
#[derive(Error, Debug)]
pub enum SitesError {
    #[error("Site detail has no location")]
    MissingLocation,

    #[error("No site with key: {0}")]
    UnknownKey(SiteKey),

    #[error("Bookmark folder {0} still has children")]
    FolderNotEmpty(FolderId),

    #[error("Invalid site detail: {0}")]
    InvalidDetail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitesError {
    /// Create a new unknown key error
    pub fn unknown_key(key: &SiteKey) -> Self {
        Self::UnknownKey(key.clone())
    }

    /// Create a new invalid detail error
    pub fn invalid_detail(msg: impl Into<String>) -> Self {
        Self::InvalidDetail(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
