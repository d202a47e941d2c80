//! Scenario files: an optional starting state plus a list of actions.
//!
//! ```json
//! {
//!   "state": { "sites": {}, "windows": [], "tabs": [] },
//!   "actions": [
//!     { "actionType": "ADD_SITE", "siteDetail": { "location": "https://www.brave.com" } }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sites_reducer::{Action, AppState, SitesReducer};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub state: AppState,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Outcome of replaying a scenario
#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub actions: usize,
    pub ignored: usize,
    pub rejected: Vec<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    /// Run every action in turn, returning the final state
    pub fn replay(&self, reducer: &SitesReducer) -> (AppState, ReplaySummary) {
        let mut state = self.state.clone();
        let mut summary = ReplaySummary {
            actions: self.actions.len(),
            ignored: 0,
            rejected: Vec::new(),
        };

        for (index, action) in self.actions.iter().enumerate() {
            if matches!(action, Action::Unknown) {
                log::debug!("Action #{} has an unrecognized type, skipping", index);
                summary.ignored += 1;
                continue;
            }
            let reduction = reducer.reduce_with_report(&state, action);
            for error in reduction.rejected {
                log::warn!("Action #{} ({}) rejected: {}", index, action.name(), error);
                summary
                    .rejected
                    .push(format!("#{} {}: {}", index, action.name(), error));
            }
            state = reduction.state;
        }

        (state, summary)
    }
}
