//! Error types for the schema version cache

use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by the cache's lookup and resolution operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The registry could not enumerate or fetch the versions of a subject
    #[error("Could not lookup versions for subject \"{subject}\": {source}")]
    SubjectLookup {
        subject: String,
        #[source]
        source: RegistryError,
    },

    /// The subject loaded, but nothing matched the requested key
    #[error("Could not find schema with attributes: {}", describe_attributes(.subject, .schema_id, .version))]
    SchemaNotFound {
        subject: String,
        schema_id: Option<u32>,
        version: Option<u32>,
    },
}

impl CacheError {
    /// Subject name the error refers to
    pub fn subject(&self) -> &str {
        match self {
            CacheError::SubjectLookup { subject, .. } => subject,
            CacheError::SchemaNotFound { subject, .. } => subject,
        }
    }

    pub fn is_subject_lookup(&self) -> bool {
        matches!(self, CacheError::SubjectLookup { .. })
    }

    pub fn is_schema_not_found(&self) -> bool {
        matches!(self, CacheError::SchemaNotFound { .. })
    }
}

fn describe_attributes(subject: &str, schema_id: &Option<u32>, version: &Option<u32>) -> String {
    let mut attributes = vec![format!("subject={}", subject)];
    if let Some(id) = schema_id {
        attributes.push(format!("schema_id={}", id));
    }
    if let Some(version) = version {
        attributes.push(format!("version={}", version));
    }
    attributes.join(", ")
}

/// Errors reported by a registry backend.
///
/// The cache never inspects these; they are carried as the source of
/// [`CacheError::SubjectLookup`].
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {subject} version {version}")]
    VersionNotFound { subject: String, version: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while parsing schema text into a validation strategy
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid JSON Schema: {0}")]
    InvalidJsonSchema(String),

    #[error("Invalid AVRO schema: {0}")]
    InvalidAvro(#[from] apache_avro::Error),
}
