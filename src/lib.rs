//! Schema Version Cache
//!
//! A read-through cache in front of a schema registry. Subjects are loaded
//! lazily (or eagerly via [`SchemaVersionCache::preload`]) and then answer
//! version, ID and schema text lookups from memory.
//!
//! ## Features
//!
//! - **Lazy Loading**: A subject is fetched in full on its first cache miss
//! - **Double Index**: Entries are reachable by version and by schema ID
//! - **Refetch on Miss**: A miss reloads the subject once before failing, so
//!   versions published later are still found
//! - **Compatibility Resolution**: Finds the highest version whose schema
//!   accepts a payload, with pluggable parser/validator strategies
//! - **Registry Backends**: In-memory and Confluent-compatible HTTP registries
//!
//! ## Example
//!
//! ```
//! use schema_version_cache::{MemoryRegistry, SchemaVersionCache};
//!
//! let registry = MemoryRegistry::new();
//! registry.register("users-value", 1, 100, r#"{"type": "object"}"#);
//!
//! let mut cache = SchemaVersionCache::new(registry);
//! assert_eq!(cache.version_numbers("users-value").unwrap(), vec![1]);
//! assert_eq!(cache.current_id("users-value").unwrap(), 100);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod schema;
pub mod strategy;

pub use cache::SchemaVersionCache;
pub use config::{CacheConfig, RegistryConfig};
pub use error::{CacheError, RegistryError, Result, StrategyError};
pub use registry::{HttpRegistry, MemoryRegistry, RegisteredSchema, Registry};
pub use schema::{SchemaEntry, SubjectEntries};
pub use strategy::{
    AvroParser, AvroValidator, JsonSchemaParser, JsonSchemaValidator, SchemaFormat, SchemaParser,
    SchemaValidator,
};
