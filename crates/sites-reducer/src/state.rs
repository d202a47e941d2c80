//! Application state tree

use crate::sites::Sites;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sites_core::SitesResult;
use std::sync::Arc;

/// Immutable application state.
///
/// Only `sites` is owned by this crate; `windows` and `tabs` are carried
/// through untouched. Clones share storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    sites: Sites,
    #[serde(default)]
    windows: Arc<Vec<Value>>,
    #[serde(default)]
    tabs: Arc<Vec<Value>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows_and_tabs(windows: Vec<Value>, tabs: Vec<Value>) -> Self {
        Self {
            sites: Sites::new(),
            windows: Arc::new(windows),
            tabs: Arc::new(tabs),
        }
    }

    pub fn from_json(json: &str) -> SitesResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SitesResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sites(&self) -> &Sites {
        &self.sites
    }

    pub fn windows(&self) -> &[Value] {
        &self.windows
    }

    pub fn tabs(&self) -> &[Value] {
        &self.tabs
    }

    /// A new state with `sites` replaced, sharing everything else
    pub(crate) fn with_sites(&self, sites: Sites) -> Self {
        Self {
            sites,
            windows: Arc::clone(&self.windows),
            tabs: Arc::clone(&self.tabs),
        }
    }
}
