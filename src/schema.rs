//! Cached schema entries and the per-subject entry store

use std::collections::HashMap;

/// One registered version of a subject's schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Subject the version belongs to (e.g., "orders-value")
    pub subject: String,
    /// Registry-assigned version number, unique within the subject
    pub version: u32,
    /// Registry-wide unique schema ID
    pub id: u32,
    /// Raw schema text as stored in the registry
    pub schema: String,
}

impl SchemaEntry {
    /// Create a new schema entry
    pub fn new(subject: impl Into<String>, version: u32, id: u32, schema: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            version,
            id,
            schema: schema.into(),
        }
    }
}

/// Every known entry of one subject, indexed by version and by ID.
///
/// Entries are owned by a single vector sorted by version; both indexes are
/// built from it in [`SubjectEntries::new`] and never updated afterwards, so a
/// reload replaces the whole value.
#[derive(Debug, Clone, Default)]
pub struct SubjectEntries {
    entries: Vec<SchemaEntry>,
    by_version: HashMap<u32, usize>,
    by_id: HashMap<u32, usize>,
}

impl SubjectEntries {
    /// Build the store for one subject from freshly loaded entries
    pub fn new(mut entries: Vec<SchemaEntry>) -> Self {
        entries.sort_by_key(|e| e.version);

        let by_version = entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.version, pos))
            .collect();
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.id, pos))
            .collect();

        Self {
            entries,
            by_version,
            by_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All entries, ascending by version
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SchemaEntry> {
        self.entries.iter()
    }

    /// All version numbers, ascending
    pub fn versions(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.version).collect()
    }

    /// Get an entry by version number
    pub fn by_version(&self, version: u32) -> Option<&SchemaEntry> {
        self.by_version.get(&version).map(|&pos| &self.entries[pos])
    }

    /// Get an entry by schema ID
    pub fn by_id(&self, id: u32) -> Option<&SchemaEntry> {
        self.by_id.get(&id).map(|&pos| &self.entries[pos])
    }

    /// Highest schema ID known for the subject.
    ///
    /// This is the maximum ID, not the ID of the highest version; the two
    /// only coincide when the registry hands out IDs in version order.
    pub fn current_id(&self) -> Option<u32> {
        self.by_id.keys().max().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> SubjectEntries {
        SubjectEntries::new(vec![
            SchemaEntry::new("foo", 3, 1002, r#"{"type":"string","doc":"C"}"#),
            SchemaEntry::new("foo", 1, 1000, r#"{"type":"string","doc":"A"}"#),
            SchemaEntry::new("foo", 2, 1001, r#"{"type":"string","doc":"B"}"#),
        ])
    }

    #[test]
    fn test_entries_sorted_by_version() {
        let entries = entries();
        assert_eq!(entries.versions(), vec![1, 2, 3]);
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_indexes_agree() {
        let entries = entries();
        for entry in entries.iter() {
            assert_eq!(entries.by_version(entry.version), Some(entry));
            assert_eq!(entries.by_id(entry.id), Some(entry));
        }
        assert!(entries.by_version(4).is_none());
        assert!(entries.by_id(2000).is_none());
    }

    #[test]
    fn test_current_id_is_max_id() {
        let entries = SubjectEntries::new(vec![
            SchemaEntry::new("foo", 1, 50, "{}"),
            SchemaEntry::new("foo", 2, 7, "{}"),
        ]);
        assert_eq!(entries.current_id(), Some(50));
        assert_eq!(SubjectEntries::default().current_id(), None);
    }
}
