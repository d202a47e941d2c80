//! Common types used throughout the sites crates

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Session partition a site was visited in (0 is the default partition)
pub type PartitionNumber = u32;

/// Identifier of a bookmark folder.
///
/// `FolderId::ROOT` is the implicit top-level folder every record without an
/// explicit parent lives in. Allocated folders start at 1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FolderId(pub i64);

impl FolderId {
    pub const ROOT: FolderId = FolderId(0);

    /// The id following this one
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag attached to a site record. Untagged records are plain history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteTag {
    Bookmark,
    BookmarkFolder,
    ReadingList,
}

impl SiteTag {
    pub fn is_folder(self) -> bool {
        matches!(self, SiteTag::BookmarkFolder)
    }
}

/// Key of a record in the sites map.
///
/// Folders are keyed by their folder id (`"3"`), everything else by
/// `location|partition|parent` (`"https://www.brave.com|0|0"`). A folder key
/// never contains `|`, so the two schemes cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    /// Wrap a key received from outside (for example a move request)
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn for_folder(folder_id: FolderId) -> Self {
        Self(folder_id.to_string())
    }

    pub fn for_location(location: &str, partition: PartitionNumber, parent: FolderId) -> Self {
        Self(format!("{}|{}|{}", location, partition, parent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SiteKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SiteKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SiteKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_key_format() {
        let key = SiteKey::for_location("https://www.brave.com", 0, FolderId::ROOT);
        assert_eq!(key.as_str(), "https://www.brave.com|0|0");
    }

    #[test]
    fn test_folder_key_is_plain_id() {
        assert_eq!(SiteKey::for_folder(FolderId(7)).as_str(), "7");
    }

    #[test]
    fn test_tag_serializes_kebab_case() {
        let json = serde_json::to_string(&SiteTag::BookmarkFolder).unwrap();
        assert_eq!(json, "\"bookmark-folder\"");
        let tag: SiteTag = serde_json::from_str("\"reading-list\"").unwrap();
        assert_eq!(tag, SiteTag::ReadingList);
    }
}
