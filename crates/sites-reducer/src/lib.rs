//! Sites reducer - bookmark and history records in the application state
//!
//! [`SitesReducer`] turns an [`AppState`] and an [`Action`] into the next
//! `AppState`. States are immutable and cheap to clone, so earlier snapshots
//! stay valid for as long as somebody holds them.

pub mod action;
pub mod history;
pub mod reducer;
pub mod site;
pub mod sites;
pub mod state;

pub use action::{Action, ClearDataDetail, SiteDetails};
pub use history::{HistoryService, RecordingHistory};
pub use reducer::{Reduction, SitesReducer};
pub use site::{SiteDetail, SiteRecord};
pub use sites::Sites;
pub use state::AppState;
