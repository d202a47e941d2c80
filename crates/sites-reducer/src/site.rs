//! Site descriptors (action payloads) and site records (stored values)

use serde::{Deserialize, Serialize};
use sites_core::{FolderId, PartitionNumber, SiteKey, SiteTag, SitesError, SitesResult, Timestamp};

/// Description of a site as carried by an action.
///
/// Every field is optional so that one malformed element of a batch can be
/// rejected on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<SiteTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_number: Option<PartitionNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

impl SiteDetail {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Default::default()
        }
    }

    /// A bookmark folder; the id is allocated by the reducer when omitted
    pub fn folder(title: impl Into<String>) -> Self {
        Self {
            tag: Some(SiteTag::BookmarkFolder),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: SiteTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_last_accessed_time(mut self, time: Timestamp) -> Self {
        self.last_accessed_time = Some(time);
        self
    }

    pub fn with_partition(mut self, partition: PartitionNumber) -> Self {
        self.partition_number = Some(partition);
        self
    }

    pub fn with_parent_folder(mut self, parent: FolderId) -> Self {
        self.parent_folder_id = Some(parent);
        self
    }

    pub fn with_folder_id(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Derive the key of the record this descriptor refers to
    pub fn key(&self) -> SitesResult<SiteKey> {
        if let Some(folder_id) = self.folder_id {
            return Ok(SiteKey::for_folder(folder_id));
        }
        if self.tag.is_some_and(SiteTag::is_folder) {
            return Err(SitesError::invalid_detail("bookmark folder without folder id"));
        }
        match self.location.as_deref() {
            Some(location) if !location.is_empty() => Ok(SiteKey::for_location(
                location,
                self.partition_number.unwrap_or_default(),
                self.parent_folder_id.unwrap_or_default(),
            )),
            _ => Err(SitesError::MissingLocation),
        }
    }
}

/// A bookmark, folder or history entry stored in the sites map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<SiteTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_time: Option<Timestamp>,
    #[serde(default)]
    pub partition_number: PartitionNumber,
    #[serde(default)]
    pub parent_folder_id: FolderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

impl SiteRecord {
    /// Build a fresh record at `order`. `tag` overrides the descriptor's own tag.
    pub(crate) fn from_detail(
        detail: &SiteDetail,
        tag: Option<SiteTag>,
        order: u32,
    ) -> SitesResult<Self> {
        let tag = match (tag.or(detail.tag), detail.folder_id) {
            (None, Some(_)) => Some(SiteTag::BookmarkFolder),
            (tag, _) => tag,
        };
        let is_folder = tag.is_some_and(SiteTag::is_folder);
        let location = detail.location.clone().unwrap_or_default();
        if location.is_empty() && !is_folder {
            return Err(SitesError::MissingLocation);
        }
        match (is_folder, detail.folder_id) {
            (true, None) => {
                return Err(SitesError::invalid_detail("bookmark folder without folder id"))
            }
            (false, Some(_)) => {
                return Err(SitesError::invalid_detail("folder id on a site that is not a folder"))
            }
            _ => {}
        }

        Ok(Self {
            location,
            tag,
            title: detail.title.clone(),
            order,
            last_accessed_time: detail.last_accessed_time,
            partition_number: detail.partition_number.unwrap_or_default(),
            parent_folder_id: detail.parent_folder_id.unwrap_or_default(),
            folder_id: detail.folder_id,
        })
    }

    /// Fold a descriptor into an existing record. Values present on the
    /// descriptor win; `order` is kept.
    ///
    /// A folder stays a folder with the same id, and a site never becomes one.
    pub(crate) fn merged_with(
        &self,
        detail: &SiteDetail,
        tag: Option<SiteTag>,
    ) -> SitesResult<Self> {
        let mut merged = self.clone();
        if let Some(location) = detail.location.as_ref().filter(|l| !l.is_empty()) {
            merged.location = location.clone();
        }
        if let Some(tag) = tag.or(detail.tag) {
            merged.tag = Some(tag);
        }
        if merged.is_folder() != self.is_folder() {
            return Err(SitesError::invalid_detail(
                "a folder and a site cannot be turned into each other",
            ));
        }
        if merged.is_folder() && detail.folder_id.is_some_and(|id| Some(id) != self.folder_id) {
            return Err(SitesError::invalid_detail("folder id cannot change"));
        }
        if detail.title.is_some() {
            merged.title = detail.title.clone();
        }
        if detail.last_accessed_time.is_some() {
            merged.last_accessed_time = detail.last_accessed_time;
        }
        if let Some(partition) = detail.partition_number {
            merged.partition_number = partition;
        }
        if let Some(parent) = detail.parent_folder_id {
            merged.parent_folder_id = parent;
        }
        Ok(merged)
    }

    /// Key of this record, `None` when it has neither a location nor a folder id
    pub fn key(&self) -> Option<SiteKey> {
        if let Some(folder_id) = self.folder_id {
            return Some(SiteKey::for_folder(folder_id));
        }
        if self.location.is_empty() {
            return None;
        }
        Some(SiteKey::for_location(
            &self.location,
            self.partition_number,
            self.parent_folder_id,
        ))
    }

    pub fn is_folder(&self) -> bool {
        self.tag.is_some_and(SiteTag::is_folder)
    }

    pub fn is_bookmark(&self) -> bool {
        self.tag == Some(SiteTag::Bookmark)
    }

    /// Untagged records only exist because the site was visited
    pub fn is_history_entry(&self) -> bool {
        self.tag.is_none()
    }
}
