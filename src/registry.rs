//! Schema Registry backends
//!
//! The cache talks to a registry through the [`Registry`] trait. Two backends
//! ship with the crate: [`MemoryRegistry`] for in-process use and tests, and
//! [`HttpRegistry`] for Confluent-compatible REST registries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

mod http;
mod memory;

pub use http::HttpRegistry;
pub use memory::MemoryRegistry;

/// Result type for registry backends
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// A schema as returned by the registry for one subject version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchema {
    /// Registry-wide unique schema ID
    pub id: u32,
    /// Raw schema text
    pub schema: String,
}

impl RegisteredSchema {
    pub fn new(id: u32, schema: impl Into<String>) -> Self {
        Self {
            id,
            schema: schema.into(),
        }
    }
}

/// Read access to a schema registry
pub trait Registry {
    /// List the version numbers registered under a subject, in any order
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>>;

    /// Fetch the ID and schema text of one subject version
    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema>;
}

impl<R: Registry + ?Sized> Registry for &R {
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        (**self).subject_versions(subject)
    }

    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema> {
        (**self).subject_version(subject, version)
    }
}

impl<R: Registry + ?Sized> Registry for Box<R> {
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        (**self).subject_versions(subject)
    }

    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema> {
        (**self).subject_version(subject, version)
    }
}

impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        (**self).subject_versions(subject)
    }

    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema> {
        (**self).subject_version(subject, version)
    }
}
