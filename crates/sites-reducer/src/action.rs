//! Actions understood by the sites reducer
//!
//! Actions arrive as JSON objects tagged by `actionType`, e.g.
//! `{"actionType": "MOVE_SITE", "sourceKey": "...", "destinationKey": "..."}`.
//! Any other `actionType` becomes [`Action::Unknown`].

use crate::site::SiteDetail;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sites_core::{SiteKey, SiteTag};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Add one or more sites, or update the ones they refer to
    #[serde(rename_all = "camelCase")]
    AddSite {
        site_detail: SiteDetails,
        /// Overrides the tag of every descriptor
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<SiteTag>,
        /// Identity of the record being edited, when it differs from
        /// `site_detail`. Single descriptor only, rejected with a batch
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_site_detail: Option<SiteDetail>,
        /// Place the added site right after this one. Single descriptor only,
        /// rejected with a batch
        #[serde(default, skip_serializing_if = "Option::is_none")]
        destination_detail: Option<SiteDetail>,
        #[serde(default)]
        skip_sync: bool,
    },

    #[serde(rename_all = "camelCase")]
    RemoveSite {
        site_detail: SiteDetail,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<SiteTag>,
        #[serde(default)]
        skip_sync: bool,
    },

    #[serde(rename_all = "camelCase")]
    MoveSite {
        source_key: SiteKey,
        destination_key: SiteKey,
        #[serde(default)]
        prepend: bool,
        #[serde(default)]
        destination_is_parent: bool,
    },

    #[serde(rename_all = "camelCase")]
    OnClearBrowsingData { clear_data_detail: ClearDataDetail },

    #[serde(other)]
    Unknown,
}

/// A single descriptor or a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteDetails {
    Many(Vec<SiteDetail>),
    One(SiteDetail),
}

/// What the user asked to clear. Only `browserHistory` concerns sites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearDataDetail {
    #[serde(default)]
    pub browser_history: bool,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl ClearDataDetail {
    pub fn browser_history() -> Self {
        Self {
            browser_history: true,
            ..Default::default()
        }
    }
}

impl Action {
    pub fn add_site(detail: SiteDetail) -> Self {
        Action::AddSite {
            site_detail: SiteDetails::One(detail),
            tag: None,
            original_site_detail: None,
            destination_detail: None,
            skip_sync: true,
        }
    }

    pub fn add_sites(details: Vec<SiteDetail>) -> Self {
        Action::AddSite {
            site_detail: SiteDetails::Many(details),
            tag: None,
            original_site_detail: None,
            destination_detail: None,
            skip_sync: true,
        }
    }

    pub fn edit_site(original: SiteDetail, detail: SiteDetail) -> Self {
        Action::AddSite {
            site_detail: SiteDetails::One(detail),
            tag: None,
            original_site_detail: Some(original),
            destination_detail: None,
            skip_sync: true,
        }
    }

    pub fn remove_site(detail: SiteDetail) -> Self {
        Action::RemoveSite {
            site_detail: detail,
            tag: None,
            skip_sync: true,
        }
    }

    pub fn move_site(
        source: impl Into<SiteKey>,
        destination: impl Into<SiteKey>,
        prepend: bool,
    ) -> Self {
        Action::MoveSite {
            source_key: source.into(),
            destination_key: destination.into(),
            prepend,
            destination_is_parent: false,
        }
    }

    pub fn clear_browsing_data(detail: ClearDataDetail) -> Self {
        Action::OnClearBrowsingData {
            clear_data_detail: detail,
        }
    }

    /// Wire name of the action, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddSite { .. } => "ADD_SITE",
            Action::RemoveSite { .. } => "REMOVE_SITE",
            Action::MoveSite { .. } => "MOVE_SITE",
            Action::OnClearBrowsingData { .. } => "ON_CLEAR_BROWSING_DATA",
            Action::Unknown => "UNKNOWN",
        }
    }
}

impl SiteDetails {
    pub fn as_slice(&self) -> &[SiteDetail] {
        match self {
            SiteDetails::Many(details) => details,
            SiteDetails::One(detail) => std::slice::from_ref(detail),
        }
    }
}
