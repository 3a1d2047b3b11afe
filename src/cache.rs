//! Schema Version Cache
//!
//! Read-through cache of subject versions, schema IDs and schema text in front
//! of a [`Registry`]. A subject is loaded in full the first time any lookup
//! misses on it and is then served from memory; a reload replaces the
//! subject's whole entry set.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{CacheError, RegistryError, Result};
use crate::registry::Registry;
use crate::schema::{SchemaEntry, SubjectEntries};
use crate::strategy::{JsonSchemaParser, JsonSchemaValidator, SchemaParser, SchemaValidator};

/// Key a lookup was searching for, reported in `SchemaNotFound`
#[derive(Debug, Clone, Copy)]
enum LookupKey {
    Any,
    SchemaId(u32),
    Version(u32),
}

/// Read-through cache of schema registry subjects
pub struct SchemaVersionCache<R> {
    /// Registry the cache reads through to
    registry: R,
    /// Loaded subjects; a missing key means "not loaded yet"
    subjects: HashMap<String, SubjectEntries>,
}

impl<R: Registry> SchemaVersionCache<R> {
    /// Create an empty cache in front of a registry
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            subjects: HashMap::new(),
        }
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Eagerly load subjects, stopping at the first one that cannot be loaded
    pub fn preload<I, S>(&mut self, subjects: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for subject in subjects {
            self.load(subject.as_ref())?;
        }
        Ok(())
    }

    /// All known version numbers of a subject, ascending.
    ///
    /// A subject with no cached versions is always (re)loaded; if the registry
    /// then reports no versions the result is empty.
    pub fn version_numbers(&mut self, subject: &str) -> Result<Vec<u32>> {
        let found = self.cached_or_load(subject, |entries| {
            (!entries.is_empty()).then(|| entries.versions())
        })?;
        Ok(found.unwrap_or_default())
    }

    /// Version number registered under a schema ID within a subject
    pub fn version_for_schema_id(&mut self, subject: &str, schema_id: u32) -> Result<u32> {
        self.lookup(subject, LookupKey::SchemaId(schema_id), |entries| {
            entries.by_id(schema_id).map(|e| e.version)
        })
    }

    /// Highest schema ID of a subject (not necessarily that of its latest version)
    pub fn current_id(&mut self, subject: &str) -> Result<u32> {
        self.lookup(subject, LookupKey::Any, SubjectEntries::current_id)
    }

    /// Schema text of a subject version
    pub fn schema_text(&mut self, subject: &str, version: u32) -> Result<&str> {
        // Same flow as `lookup`, spelled out because the result borrows the store
        if self.cached_entry(subject, version).is_some() {
            trace!(subject, "Schema cache hit");
        } else {
            self.load(subject)?;
        }

        self.cached_entry(subject, version)
            .map(|entry| entry.schema.as_str())
            .ok_or_else(|| not_found(subject, LookupKey::Version(version)))
    }

    /// Schema ID of a subject version
    pub fn schema_id_for_version(&mut self, subject: &str, version: u32) -> Result<u32> {
        self.lookup(subject, LookupKey::Version(version), |entries| {
            entries.by_version(version).map(|e| e.id)
        })
    }

    /// Highest version whose JSON Schema accepts `data`.
    ///
    /// Uses [`JsonSchemaParser`] and [`JsonSchemaValidator`]; see
    /// [`find_compatible_version_with`](Self::find_compatible_version_with).
    pub fn find_compatible_version(&mut self, subject: &str, data: &serde_json::Value) -> Result<u32> {
        self.find_compatible_version_with(subject, data, &JsonSchemaParser, &JsonSchemaValidator)
    }

    /// Highest version whose parsed schema the validator accepts for `data`.
    ///
    /// Cached versions are tried from highest to lowest. When none matches,
    /// the subject is reloaded once from the registry and the scan repeated,
    /// so a version published since the last load is still found.
    pub fn find_compatible_version_with<S, D, P, V>(
        &mut self,
        subject: &str,
        data: &D,
        parser: &P,
        validator: &V,
    ) -> Result<u32>
    where
        D: ?Sized,
        P: SchemaParser<S>,
        V: SchemaValidator<S, D>,
    {
        if !self.subjects.contains_key(subject) {
            self.load(subject)?;
        }

        if let Some(version) = self.scan_compatible(subject, data, parser, validator) {
            return Ok(version);
        }

        debug!(subject, "No cached version matched, reloading subject");
        self.load(subject)?;

        self.scan_compatible(subject, data, parser, validator)
            .ok_or_else(|| not_found(subject, LookupKey::Any))
    }

    /// Whether a subject has been loaded
    pub fn is_cached(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    /// Names of all loaded subjects, sorted
    pub fn cached_subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<_> = self.subjects.keys().map(String::as_str).collect();
        subjects.sort_unstable();
        subjects
    }

    /// Cached entries of a subject, without touching the registry
    pub fn entries(&self, subject: &str) -> Option<&SubjectEntries> {
        self.subjects.get(subject)
    }

    fn cached_entry(&self, subject: &str, version: u32) -> Option<&SchemaEntry> {
        self.subjects.get(subject)?.by_version(version)
    }

    /// Answer from cache, else load the subject once and retry, else fail
    fn lookup<T>(
        &mut self,
        subject: &str,
        key: LookupKey,
        find: impl Fn(&SubjectEntries) -> Option<T>,
    ) -> Result<T> {
        self.cached_or_load(subject, find)?
            .ok_or_else(|| not_found(subject, key))
    }

    fn cached_or_load<T>(
        &mut self,
        subject: &str,
        find: impl Fn(&SubjectEntries) -> Option<T>,
    ) -> Result<Option<T>> {
        if let Some(found) = self.subjects.get(subject).and_then(&find) {
            trace!(subject, "Schema cache hit");
            return Ok(Some(found));
        }

        self.load(subject)?;
        Ok(self.subjects.get(subject).and_then(&find))
    }

    /// Replace a subject's entries with a fresh copy from the registry
    fn load(&mut self, subject: &str) -> Result<()> {
        let entries = self
            .fetch_entries(subject)
            .map_err(|source| CacheError::SubjectLookup {
                subject: subject.to_string(),
                source,
            })?;

        debug!(subject, versions = entries.len(), "Loaded subject from registry");
        self.subjects
            .insert(subject.to_string(), SubjectEntries::new(entries));
        Ok(())
    }

    fn fetch_entries(&self, subject: &str) -> std::result::Result<Vec<SchemaEntry>, RegistryError> {
        let mut versions = self.registry.subject_versions(subject)?;
        versions.sort_unstable();

        versions
            .into_iter()
            .map(|version| {
                let registered = self.registry.subject_version(subject, version)?;
                Ok(SchemaEntry::new(subject, version, registered.id, registered.schema))
            })
            .collect()
    }

    fn scan_compatible<S, D, P, V>(&self, subject: &str, data: &D, parser: &P, validator: &V) -> Option<u32>
    where
        D: ?Sized,
        P: SchemaParser<S>,
        V: SchemaValidator<S, D>,
    {
        let entries = self.subjects.get(subject)?;

        entries.iter().rev().find_map(|entry| match parser.parse(&entry.schema) {
            Ok(schema) => validator.validate(&schema, data).then_some(entry.version),
            Err(e) => {
                warn!(
                    subject,
                    version = entry.version,
                    error = %e,
                    "Skipping schema that failed to parse"
                );
                None
            }
        })
    }
}

fn not_found(subject: &str, key: LookupKey) -> CacheError {
    let (schema_id, version) = match key {
        LookupKey::Any => (None, None),
        LookupKey::SchemaId(id) => (Some(id), None),
        LookupKey::Version(version) => (None, Some(version)),
    };

    CacheError::SchemaNotFound {
        subject: subject.to_string(),
        schema_id,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use crate::error::StrategyError;

    fn registry() -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        registry.register("foo", 2, 1001, r#"{"type":"string","doc":"B"}"#);
        registry.register("foo", 1, 1000, r#"{"type":"string","doc":"A"}"#);
        registry.register("foo", 3, 1002, r#"{"type":"string","doc":"C"}"#);
        registry
    }

    #[test]
    fn test_lookups_share_one_load() {
        let registry = registry();
        let mut cache = SchemaVersionCache::new(registry.clone());

        assert_eq!(cache.version_numbers("foo").unwrap(), vec![1, 2, 3]);
        assert_eq!(cache.current_id("foo").unwrap(), 1002);
        assert_eq!(cache.version_for_schema_id("foo", 1001).unwrap(), 2);
        assert_eq!(cache.schema_id_for_version("foo", 1).unwrap(), 1000);
        assert_eq!(cache.schema_text("foo", 3).unwrap(), r#"{"type":"string","doc":"C"}"#);

        assert_eq!(registry.version_list_calls(), 1);
        assert_eq!(registry.version_fetch_calls(), 3);
    }

    #[test]
    fn test_miss_reloads_once_then_fails() {
        let registry = registry();
        let mut cache = SchemaVersionCache::new(registry.clone());
        cache.preload(["foo"]).unwrap();

        let err = cache.version_for_schema_id("foo", 2000).unwrap_err();
        assert!(err.is_schema_not_found());
        assert_eq!(registry.version_list_calls(), 2);
    }

    #[test]
    fn test_miss_picks_up_new_version() {
        let registry = registry();
        let mut cache = SchemaVersionCache::new(registry.clone());
        cache.preload(["foo"]).unwrap();

        registry.register("foo", 4, 1003, r#"{"type":"string","doc":"D"}"#);
        assert_eq!(cache.schema_id_for_version("foo", 4).unwrap(), 1003);
        assert_eq!(cache.version_numbers("foo").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_failed_reload_keeps_previous_entries() {
        let registry = registry();
        let mut cache = SchemaVersionCache::new(registry.clone());
        cache.preload(["foo"]).unwrap();
        registry.clear();

        let err = cache.schema_text("foo", 9).unwrap_err();
        assert!(err.is_subject_lookup());
        assert_eq!(cache.schema_id_for_version("foo", 2).unwrap(), 1001);
    }

    #[test]
    fn test_unparseable_schema_is_skipped() {
        let registry = MemoryRegistry::new();
        registry.register("foo", 1, 1, "1");
        registry.register("foo", 2, 2, "broken");
        let mut cache = SchemaVersionCache::new(registry);

        let parser = |text: &str| -> std::result::Result<u32, StrategyError> {
            serde_json::from_str(text).map_err(StrategyError::from)
        };
        let validator = |schema: &u32, data: &u32| schema == data;

        assert_eq!(cache.find_compatible_version_with("foo", &1, &parser, &validator).unwrap(), 1);
    }

    #[test]
    fn test_cached_subjects() {
        let registry = registry();
        registry.register("bar", 1, 2000, "{}");
        let mut cache = SchemaVersionCache::new(registry);

        assert!(!cache.is_cached("foo"));
        cache.preload(["foo", "bar"]).unwrap();
        assert!(cache.is_cached("foo"));
        assert_eq!(cache.cached_subjects(), vec!["bar", "foo"]);
        assert_eq!(cache.entries("bar").map(SubjectEntries::len), Some(1));
    }
}
