//! In-process registry backend

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::{RegisteredSchema, Registry, RegistryResult};
use crate::error::RegistryError;

/// Versions of one subject, kept in registration order
type SubjectVersions = Vec<(u32, RegisteredSchema)>;

#[derive(Debug, Default)]
struct Counters {
    version_lists: AtomicUsize,
    version_fetches: AtomicUsize,
}

/// A registry held in memory.
///
/// Clones share the same data, so a handle kept by the caller sees (and can
/// change) what a cache built from another clone reads. Version lists are
/// returned in registration order, not sorted.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    subjects: Arc<RwLock<BTreeMap<String, SubjectVersions>>>,
    counters: Arc<Counters>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema version, replacing any existing one with the same number
    pub fn register(&self, subject: impl Into<String>, version: u32, id: u32, schema: impl Into<String>) {
        let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
        let versions = subjects.entry(subject.into()).or_default();
        let registered = RegisteredSchema::new(id, schema);

        match versions.iter_mut().find(|(v, _)| *v == version) {
            Some((_, existing)) => *existing = registered,
            None => versions.push((version, registered)),
        }
    }

    /// Remove a subject and all its versions; returns whether it existed
    pub fn remove_subject(&self, subject: &str) -> bool {
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject)
            .is_some()
    }

    /// Remove every subject
    pub fn clear(&self) {
        self.subjects.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Names of all registered subjects, sorted
    pub fn subjects(&self) -> Vec<String> {
        self.subjects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of `subject_versions` calls served so far
    pub fn version_list_calls(&self) -> usize {
        self.counters.version_lists.load(Ordering::Relaxed)
    }

    /// Number of `subject_version` calls served so far
    pub fn version_fetch_calls(&self) -> usize {
        self.counters.version_fetches.load(Ordering::Relaxed)
    }
}

impl Registry for MemoryRegistry {
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        self.counters.version_lists.fetch_add(1, Ordering::Relaxed);

        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects
            .get(subject)
            .map(|versions| versions.iter().map(|(v, _)| *v).collect())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema> {
        self.counters.version_fetches.fetch_add(1, Ordering::Relaxed);

        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        let versions = subjects
            .get(subject)
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;

        versions
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, registered)| registered.clone())
            .ok_or_else(|| RegistryError::VersionNotFound {
                subject: subject.to_string(),
                version,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_in_registration_order() {
        let registry = MemoryRegistry::new();
        registry.register("foo", 3, 1002, "{}");
        registry.register("foo", 1, 1000, "{}");
        registry.register("foo", 2, 1001, "{}");

        assert_eq!(registry.subject_versions("foo").unwrap(), vec![3, 1, 2]);
        assert_eq!(registry.subject_version("foo", 1).unwrap().id, 1000);
        assert_eq!(registry.version_list_calls(), 1);
        assert_eq!(registry.version_fetch_calls(), 1);
    }

    #[test]
    fn test_register_replaces_existing_version() {
        let registry = MemoryRegistry::new();
        registry.register("foo", 1, 1000, "old");
        registry.register("foo", 1, 1005, "new");

        assert_eq!(registry.subject_versions("foo").unwrap(), vec![1]);
        assert_eq!(
            registry.subject_version("foo", 1).unwrap(),
            RegisteredSchema::new(1005, "new")
        );
    }

    #[test]
    fn test_clones_share_data() {
        let registry = MemoryRegistry::new();
        let handle = registry.clone();
        handle.register("bar", 1, 2000, "{}");

        assert_eq!(registry.subjects(), vec!["bar".to_string()]);
        assert!(handle.remove_subject("bar"));
        assert!(!handle.remove_subject("bar"));
        assert!(matches!(
            registry.subject_versions("bar"),
            Err(RegistryError::SubjectNotFound(_))
        ));
    }

    #[test]
    fn test_missing_version() {
        let registry = MemoryRegistry::new();
        registry.register("foo", 1, 1000, "{}");

        assert!(matches!(
            registry.subject_version("foo", 9),
            Err(RegistryError::VersionNotFound { version: 9, .. })
        ));
    }
}
