//! The persistent sites collection

use crate::site::{SiteDetail, SiteRecord};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use sites_core::{FolderId, SiteKey, SiteTag, SitesError, SitesResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How a moved record's parent folder is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reparent {
    /// Move into the destination when it is a folder, otherwise next to it
    IntoDestination,
    /// Adopt the destination's parent folder
    AlongsideDestination,
    /// Keep the current parent folder
    Keep,
}

/// Site records keyed by [`SiteKey`] and iterated in ascending `order`.
///
/// Cloning is O(1). Changes go through copy-on-write, so a clone held by an
/// earlier state never observes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sites {
    records: Arc<BTreeMap<SiteKey, SiteRecord>>,
}

impl Sites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in any order.
    ///
    /// Keys are derived from the records, records without a key are dropped
    /// and orders are renumbered densely keeping their relative order.
    pub fn from_records(records: impl IntoIterator<Item = SiteRecord>) -> Self {
        let mut records: Vec<SiteRecord> = records.into_iter().collect();
        records.sort_by_key(|record| record.order);

        let mut map = BTreeMap::new();
        for record in records {
            match record.key() {
                Some(key) => {
                    if map.insert(key.clone(), record).is_some() {
                        log::warn!("Duplicate site key {}, keeping the later record", key);
                    }
                }
                None => log::warn!("Dropping site record without location or folder id"),
            }
        }

        let mut sites = Self {
            records: Arc::new(map),
        };
        sites.compact();
        sites
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SiteRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Entries in ascending `order`
    pub fn iter(&self) -> impl Iterator<Item = (&SiteKey, &SiteRecord)> + '_ {
        let mut entries: Vec<_> = self.records.iter().collect();
        entries.sort_by(|(a_key, a), (b_key, b)| a.order.cmp(&b.order).then(a_key.cmp(b_key)));
        entries.into_iter()
    }

    /// Records in ascending `order`
    pub fn values(&self) -> impl Iterator<Item = &SiteRecord> + '_ {
        self.iter().map(|(_, record)| record)
    }

    /// Keys in ascending `order`
    pub fn ordered_keys(&self) -> Vec<SiteKey> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Direct children of a bookmark folder, in order
    pub fn children(&self, folder: FolderId) -> impl Iterator<Item = &SiteRecord> + '_ {
        self.values().filter(move |record| {
            record.parent_folder_id == folder && record.folder_id != Some(folder)
        })
    }

    /// Whether both handles share the same underlying storage
    pub fn ptr_eq(&self, other: &Sites) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Id for a newly created bookmark folder
    pub fn next_folder_id(&self) -> FolderId {
        self.records
            .values()
            .filter_map(|record| record.folder_id)
            .max()
            .unwrap_or(FolderId::ROOT)
            .max(FolderId::ROOT)
            .next()
    }

    fn has_children(&self, folder: FolderId) -> bool {
        self.children(folder).next().is_some()
    }

    /// Whether `parent` is `folder` or nested somewhere below it
    fn is_within(&self, mut parent: FolderId, folder: FolderId) -> bool {
        // bounded walk, stored data may already contain a cycle
        for _ in 0..=self.records.len() {
            if parent == folder {
                return true;
            }
            if parent == FolderId::ROOT {
                return false;
            }
            match self.records.get(SiteKey::for_folder(parent).as_str()) {
                Some(record) => parent = record.parent_folder_id,
                None => return false,
            }
        }
        false
    }

    fn compact(&mut self) {
        let keys = self.ordered_keys();
        self.renumber(&keys);
    }

    /// Assign `order = index` following `keys`
    fn renumber(&mut self, keys: &[SiteKey]) {
        let changed = keys.iter().enumerate().any(|(index, key)| {
            self.records
                .get(key)
                .is_some_and(|record| record.order != index as u32)
        });
        if !changed {
            return;
        }

        let map = Arc::make_mut(&mut self.records);
        for (index, key) in keys.iter().enumerate() {
            if let Some(record) = map.get_mut(key) {
                record.order = index as u32;
            }
        }
    }

    /// Insert a descriptor or merge it into the record it refers to.
    ///
    /// `original` names the record being edited when the descriptor changes
    /// identity fields. New records are appended at the end.
    pub(crate) fn add(
        &mut self,
        detail: &SiteDetail,
        tag: Option<SiteTag>,
        original: Option<&SiteDetail>,
    ) -> SitesResult<SiteKey> {
        let detail_key = detail.key()?;
        let old_key = match original {
            Some(original) => original.key()?,
            None => detail_key.clone(),
        };

        let existing = self
            .records
            .get(&old_key)
            .map(|record| (old_key.clone(), record))
            .or_else(|| {
                self.records
                    .get(&detail_key)
                    .map(|record| (detail_key.clone(), record))
            });
        let (replaced_key, record) = match existing {
            Some((key, old)) => (Some(key), old.merged_with(detail, tag)?),
            None => (
                None,
                SiteRecord::from_detail(detail, tag, self.records.len() as u32)?,
            ),
        };
        let key = record.key().ok_or(SitesError::MissingLocation)?;

        let map = Arc::make_mut(&mut self.records);
        if let Some(replaced) = &replaced_key {
            if *replaced != key {
                map.remove(replaced);
            }
        }
        let displaced = replaced_key.as_ref() != Some(&key) && map.contains_key(&key);
        map.insert(key.clone(), record);

        if displaced {
            log::debug!("Site {} replaced an existing record", key);
            self.compact();
        }
        Ok(key)
    }

    /// Remove the record a descriptor refers to.
    ///
    /// With a `tag`, only a record carrying that tag is affected, and one that
    /// was also visited keeps living on as a history entry. Returns whether
    /// anything changed.
    pub(crate) fn remove(
        &mut self,
        detail: &SiteDetail,
        tag: Option<SiteTag>,
    ) -> SitesResult<bool> {
        let key = detail.key()?;
        let Some(record) = self.records.get(&key) else {
            return Ok(false);
        };
        let (record_tag, visited, folder_id) =
            (record.tag, record.last_accessed_time.is_some(), record.folder_id);

        if let Some(tag) = tag {
            if record_tag != Some(tag) {
                return Ok(false);
            }
            if visited && !tag.is_folder() {
                if let Some(record) = Arc::make_mut(&mut self.records).get_mut(&key) {
                    record.tag = None;
                }
                return Ok(true);
            }
        }

        if let Some(folder_id) = folder_id {
            if self.has_children(folder_id) {
                return Err(SitesError::FolderNotEmpty(folder_id));
            }
        }

        Arc::make_mut(&mut self.records).remove(&key);
        self.compact();
        Ok(true)
    }

    /// Move `source` next to `destination`, after it unless `prepend`.
    ///
    /// Returns the record's key after the move, which differs from `source`
    /// when the parent folder changed, or `None` when source and destination
    /// are the same record.
    pub(crate) fn move_site(
        &mut self,
        source: &SiteKey,
        destination: &SiteKey,
        prepend: bool,
        reparent: Reparent,
    ) -> SitesResult<Option<SiteKey>> {
        if source == destination {
            return Ok(None);
        }
        let source_record = self
            .records
            .get(source)
            .ok_or_else(|| SitesError::unknown_key(source))?;
        let destination_record = self
            .records
            .get(destination)
            .ok_or_else(|| SitesError::unknown_key(destination))?;

        let mut moved = source_record.clone();
        match (reparent, destination_record.folder_id) {
            (Reparent::Keep, _) => {}
            (Reparent::IntoDestination, Some(folder_id)) => moved.parent_folder_id = folder_id,
            _ => moved.parent_folder_id = destination_record.parent_folder_id,
        }

        if let Some(folder_id) = moved.folder_id {
            if self.is_within(moved.parent_folder_id, folder_id) {
                return Err(SitesError::invalid_detail(format!(
                    "folder {} cannot be moved into itself",
                    folder_id
                )));
            }
        }

        let new_key = moved.key().ok_or(SitesError::MissingLocation)?;
        if new_key != *source && self.records.contains_key(&new_key) {
            return Err(SitesError::invalid_detail(format!(
                "{} already exists in the destination folder",
                new_key
            )));
        }

        let mut keys = self.ordered_keys();
        keys.retain(|key| key != source);
        let destination_index = keys
            .iter()
            .position(|key| key == destination)
            .ok_or_else(|| SitesError::unknown_key(destination))?;
        let index = if prepend {
            destination_index
        } else {
            destination_index + 1
        };
        keys.insert(index, new_key.clone());

        let map = Arc::make_mut(&mut self.records);
        map.remove(source);
        map.insert(new_key.clone(), moved);
        self.renumber(&keys);

        Ok(Some(new_key))
    }

    /// Forget browsing history: untagged records go away, tagged ones lose
    /// their last access time. Returns the number of records removed.
    pub(crate) fn clear_history(&mut self) -> usize {
        let touched = self
            .records
            .values()
            .any(|record| record.is_history_entry() || record.last_accessed_time.is_some());
        if !touched {
            return 0;
        }

        let map = Arc::make_mut(&mut self.records);
        let before = map.len();
        map.retain(|_, record| !record.is_history_entry());
        for record in map.values_mut() {
            record.last_accessed_time = None;
        }
        let purged = before - map.len();

        self.compact();
        purged
    }
}

impl Serialize for Sites {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, record) in self.iter() {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sites {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Stored keys are not trusted, they are derived again from the records
        let stored = BTreeMap::<String, SiteRecord>::deserialize(deserializer)?;
        Ok(Sites::from_records(stored.into_values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites_with(locations: &[&str]) -> Sites {
        let mut sites = Sites::new();
        for location in locations {
            sites.add(&SiteDetail::new(*location), None, None).unwrap();
        }
        sites
    }

    fn locations(sites: &Sites) -> Vec<&str> {
        sites.values().map(|record| record.location.as_str()).collect()
    }

    fn key(location: &str) -> SiteKey {
        SiteKey::for_location(location, 0, FolderId::ROOT)
    }

    #[test]
    fn test_add_appends_in_order() {
        let sites = sites_with(&["a", "b", "c"]);
        assert_eq!(locations(&sites), vec!["a", "b", "c"]);
        let orders: Vec<u32> = sites.values().map(|record| record.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_ignores_descriptor_order_for_new_records() {
        let mut sites = Sites::new();
        for location in ["a", "b", "c"] {
            sites
                .add(&SiteDetail::new(location).with_order(1), None, None)
                .unwrap();
        }
        assert_eq!(locations(&sites), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_existing_key_merges() {
        let mut sites = sites_with(&["a", "b"]);
        sites
            .add(
                &SiteDetail::new("a").with_tag(SiteTag::Bookmark).with_title("A"),
                None,
                None,
            )
            .unwrap();

        assert_eq!(sites.len(), 2);
        let record = sites.get(key("a").as_str()).unwrap();
        assert_eq!(record.order, 0);
        assert!(record.is_bookmark());
        assert_eq!(record.title.as_deref(), Some("A"));
    }

    #[test]
    fn test_edit_with_original_rekeys_in_place() {
        let mut sites = sites_with(&["a", "b", "c"]);
        let original = SiteDetail::new("b");
        let new_key = sites
            .add(&SiteDetail::new("b2"), None, Some(&original))
            .unwrap();

        assert_eq!(new_key, key("b2"));
        assert!(!sites.contains_key(key("b").as_str()));
        assert_eq!(locations(&sites), vec!["a", "b2", "c"]);
    }

    #[test]
    fn test_edit_onto_existing_key_compacts() {
        let mut sites = sites_with(&["a", "b", "c"]);
        sites
            .add(&SiteDetail::new("c"), None, Some(&SiteDetail::new("a")))
            .unwrap();

        assert_eq!(sites.len(), 2);
        let orders: Vec<u32> = sites.values().map(|record| record.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(locations(&sites), vec!["c", "b"]);
    }

    #[test]
    fn test_add_rejects_missing_location() {
        let mut sites = Sites::new();
        let result = sites.add(&SiteDetail::default(), None, None);
        assert!(matches!(result, Err(SitesError::MissingLocation)));
        assert!(sites.is_empty());
    }

    #[test]
    fn test_remove_compacts_orders() {
        let mut sites = sites_with(&["a", "b", "c"]);
        assert!(sites.remove(&SiteDetail::new("a"), None).unwrap());
        assert_eq!(locations(&sites), vec!["b", "c"]);
        let orders: Vec<u32> = sites.values().map(|record| record.order).collect();
        assert_eq!(orders, vec![0, 1]);

        assert!(!sites.remove(&SiteDetail::new("a"), None).unwrap());
    }

    #[test]
    fn test_remove_bookmark_tag_keeps_visited_entry() {
        let mut sites = Sites::new();
        sites
            .add(
                &SiteDetail::new("a")
                    .with_tag(SiteTag::Bookmark)
                    .with_last_accessed_time(42),
                None,
                None,
            )
            .unwrap();

        assert!(sites
            .remove(&SiteDetail::new("a"), Some(SiteTag::Bookmark))
            .unwrap());
        let record = sites.get(key("a").as_str()).unwrap();
        assert!(record.is_history_entry());
        assert_eq!(record.last_accessed_time, Some(42));
    }

    #[test]
    fn test_remove_with_other_tag_is_noop() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::new("a").with_tag(SiteTag::Bookmark), None, None)
            .unwrap();
        assert!(!sites
            .remove(&SiteDetail::new("a"), Some(SiteTag::ReadingList))
            .unwrap());
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn test_remove_non_empty_folder_is_rejected() {
        let mut sites = Sites::new();
        let folder = SiteDetail::folder("Work").with_folder_id(FolderId(1));
        sites.add(&folder, None, None).unwrap();
        sites
            .add(
                &SiteDetail::new("a")
                    .with_tag(SiteTag::Bookmark)
                    .with_parent_folder(FolderId(1)),
                None,
                None,
            )
            .unwrap();

        assert!(matches!(
            sites.remove(&folder, None),
            Err(SitesError::FolderNotEmpty(FolderId(1)))
        ));
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn test_move_after_destination() {
        let mut sites = sites_with(&["a", "b", "c"]);
        sites
            .move_site(&key("c"), &key("a"), false, Reparent::AlongsideDestination)
            .unwrap();
        assert_eq!(locations(&sites), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_move_prepend_before_destination() {
        let mut sites = sites_with(&["a", "b", "c"]);
        sites
            .move_site(&key("a"), &key("c"), true, Reparent::AlongsideDestination)
            .unwrap();
        assert_eq!(locations(&sites), vec!["b", "a", "c"]);
        let orders: Vec<u32> = sites.values().map(|record| record.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_move_unknown_key_is_error_and_noop() {
        let mut sites = sites_with(&["a", "b"]);
        let before = sites.clone();
        let result = sites.move_site(&key("zzz"), &key("a"), false, Reparent::AlongsideDestination);
        assert!(matches!(result, Err(SitesError::UnknownKey(_))));
        assert_eq!(sites, before);
    }

    #[test]
    fn test_move_onto_itself_is_noop() {
        let mut sites = sites_with(&["a", "b"]);
        let before = sites.clone();

        let moved = sites
            .move_site(&key("a"), &key("a"), true, Reparent::AlongsideDestination)
            .unwrap();
        assert_eq!(moved, None);
        assert_eq!(sites, before);
        assert!(sites.ptr_eq(&before));
    }

    #[test]
    fn test_move_onto_taken_key_is_rejected() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::folder("Work").with_folder_id(FolderId(1)), None, None)
            .unwrap();
        sites.add(&SiteDetail::new("a"), None, None).unwrap();
        sites
            .add(&SiteDetail::new("a").with_parent_folder(FolderId(1)), None, None)
            .unwrap();
        let before = sites.clone();

        let folder_key = SiteKey::for_folder(FolderId(1));
        let result = sites.move_site(&key("a"), &folder_key, false, Reparent::IntoDestination);

        match result {
            Err(SitesError::InvalidDetail(message)) => assert!(message.contains("a|0|1")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(sites, before);
    }

    #[test]
    fn test_add_cannot_turn_folder_into_bookmark() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::folder("Work").with_folder_id(FolderId(1)), None, None)
            .unwrap();
        let before = sites.clone();

        let result = sites.add(
            &SiteDetail::default().with_folder_id(FolderId(1)),
            Some(SiteTag::Bookmark),
            None,
        );
        assert!(matches!(result, Err(SitesError::InvalidDetail(_))));
        assert_eq!(sites, before);
        assert!(sites.get("1").unwrap().is_folder());
    }

    #[test]
    fn test_move_into_folder_rekeys() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::folder("Work").with_folder_id(FolderId(1)), None, None)
            .unwrap();
        sites
            .add(&SiteDetail::new("a").with_tag(SiteTag::Bookmark), None, None)
            .unwrap();

        let folder_key = SiteKey::for_folder(FolderId(1));
        let new_key = sites
            .move_site(&key("a"), &folder_key, false, Reparent::IntoDestination)
            .unwrap()
            .unwrap();

        assert_eq!(new_key.as_str(), "a|0|1");
        assert!(!sites.contains_key(key("a").as_str()));
        assert_eq!(sites.children(FolderId(1)).count(), 1);
    }

    #[test]
    fn test_move_folder_into_itself_is_rejected() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::folder("Outer").with_folder_id(FolderId(1)), None, None)
            .unwrap();
        sites
            .add(
                &SiteDetail::folder("Inner")
                    .with_folder_id(FolderId(2))
                    .with_parent_folder(FolderId(1)),
                None,
                None,
            )
            .unwrap();

        let result = sites.move_site(
            &SiteKey::for_folder(FolderId(1)),
            &SiteKey::for_folder(FolderId(2)),
            false,
            Reparent::IntoDestination,
        );
        assert!(matches!(result, Err(SitesError::InvalidDetail(_))));
    }

    #[test]
    fn test_clear_history() {
        let mut sites = Sites::new();
        sites
            .add(&SiteDetail::new("visited").with_last_accessed_time(1), None, None)
            .unwrap();
        sites
            .add(
                &SiteDetail::new("bookmark")
                    .with_tag(SiteTag::Bookmark)
                    .with_last_accessed_time(2),
                None,
                None,
            )
            .unwrap();

        assert_eq!(sites.clear_history(), 1);
        assert_eq!(locations(&sites), vec!["bookmark"]);
        let record = sites.values().next().unwrap();
        assert_eq!(record.order, 0);
        assert_eq!(record.last_accessed_time, None);
    }

    #[test]
    fn test_clone_is_not_affected_by_changes() {
        let mut sites = sites_with(&["a", "b"]);
        let snapshot = sites.clone();
        assert!(sites.ptr_eq(&snapshot));

        sites.remove(&SiteDetail::new("a"), None).unwrap();
        assert!(!sites.ptr_eq(&snapshot));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(locations(&snapshot), vec!["a", "b"]);
    }

    #[test]
    fn test_next_folder_id() {
        let mut sites = Sites::new();
        assert_eq!(sites.next_folder_id(), FolderId(1));
        sites
            .add(&SiteDetail::folder("Work").with_folder_id(FolderId(4)), None, None)
            .unwrap();
        assert_eq!(sites.next_folder_id(), FolderId(5));
    }

    #[test]
    fn test_deserialize_rekeys_and_sorts() {
        let json = r#"{
            "stale-key": {"location": "b", "order": 7},
            "other": {"location": "a", "order": 3},
            "broken": {"order": 1}
        }"#;
        let sites: Sites = serde_json::from_str(json).unwrap();
        assert_eq!(sites.ordered_keys(), vec![key("a"), key("b")]);
        assert_eq!(sites.get(key("b").as_str()).unwrap().order, 1);
    }

    #[test]
    fn test_serialize_in_order() {
        let mut sites = sites_with(&["z", "a"]);
        sites
            .move_site(&key("a"), &key("z"), true, Reparent::AlongsideDestination)
            .unwrap();
        let json = serde_json::to_string(&sites).unwrap();
        let a = json.find("\"a|0|0\"").unwrap();
        let z = json.find("\"z|0|0\"").unwrap();
        assert!(a < z);
    }
}
