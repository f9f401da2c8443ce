// Set of selected tables, keyed by (page, table index)
use std::collections::BTreeSet;

use crate::types::{TableCache, TableKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<TableKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `key`. Keys that do not name one of the
    /// `tables_on_page` tables of the shown page are refused (returns false).
    pub fn toggle(&mut self, key: TableKey, tables_on_page: usize) -> bool {
        if key.index >= tables_on_page {
            return false;
        }
        if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
        true
    }

    /// Replaces the selection with every table of one page.
    pub fn select_all_on_page(&mut self, page: usize, count: usize) {
        self.keys = (0..count).map(|index| TableKey::new(page, index)).collect();
    }

    pub fn contains(&self, key: &TableKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Sorted page-major, then by table index.
    pub fn iter(&self) -> impl Iterator<Item = &TableKey> {
        self.keys.iter()
    }

    pub fn retain_cached(&mut self, cache: &TableCache) {
        self.keys.retain(|key| cache.get(*key).is_some());
    }

    /// Status line shown after the selection changed.
    pub fn status_text(&self) -> String {
        if self.is_empty() {
            "Click handles or inside rectangles to select.".to_string()
        } else {
            format!("{} table(s) selected. Export or select more.", self.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, ExtractedTable};

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut selection = Selection::new();
        selection.toggle(TableKey::new(0, 1), 3);
        let before = selection.clone();

        assert!(selection.toggle(TableKey::new(0, 2), 3));
        assert!(selection.contains(&TableKey::new(0, 2)));
        assert!(selection.toggle(TableKey::new(0, 2), 3));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_toggle_refuses_tables_not_on_page() {
        let mut selection = Selection::new();
        assert!(!selection.toggle(TableKey::new(0, 3), 3));
        assert!(!selection.toggle(TableKey::new(1, 0), 0));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_replaces_other_pages() {
        let mut selection = Selection::new();
        selection.toggle(TableKey::new(4, 0), 1);
        selection.select_all_on_page(1, 3);

        let keys: Vec<TableKey> = selection.iter().copied().collect();
        assert_eq!(keys, vec![TableKey::new(1, 0), TableKey::new(1, 1), TableKey::new(1, 2)]);
    }

    #[test]
    fn test_retain_cached_drops_stale_keys() {
        let mut cache = TableCache::new(2);
        cache.insert_page(0, vec![ExtractedTable::new(vec![], BBox::default())]);
        cache.insert_page(1, vec![]);

        let mut selection = Selection::new();
        selection.toggle(TableKey::new(0, 0), 1);
        selection.toggle(TableKey::new(1, 0), 1);
        selection.retain_cached(&cache);

        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&TableKey::new(0, 0)));
    }

    #[test]
    fn test_status_text() {
        let mut selection = Selection::new();
        assert_eq!(selection.status_text(), "Click handles or inside rectangles to select.");
        selection.select_all_on_page(0, 2);
        assert_eq!(selection.status_text(), "2 table(s) selected. Export or select more.");
    }
}
