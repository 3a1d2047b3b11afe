//! HTTP backend for Confluent-compatible schema registries

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RegisteredSchema, Registry, RegistryResult};
use crate::config::RegistryConfig;
use crate::error::RegistryError;

const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Registry error codes for missing subjects and versions
const SUBJECT_NOT_FOUND: u32 = 40401;
const VERSION_NOT_FOUND: u32 = 40402;

/// Blocking client for the registry REST API
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct VersionResponse {
    id: u32,
    schema: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error_code: u32,
    message: String,
}

impl HttpRegistry {
    /// Create a client from registry settings
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Base URL requests are made against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/subjects/{subject}/versions[/{version}]`
    fn versions_url(&self, subject: &str, version: Option<u32>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("subjects").push(subject).push("versions");
            if let Some(version) = version {
                segments.push(&version.to_string());
            }
        }
        url
    }

    fn get<T: DeserializeOwned>(&self, subject: &str, version: Option<u32>) -> RegistryResult<T> {
        let url = self.versions_url(subject, version);
        tracing::debug!(url = %url, "Fetching from schema registry");

        let mut request = self.client.get(url).header(ACCEPT, SCHEMA_REGISTRY_CONTENT_TYPE);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(subject, version, status.as_u16(), &body));
        }

        response
            .json()
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }
}

impl Registry for HttpRegistry {
    fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        self.get(subject, None)
    }

    fn subject_version(&self, subject: &str, version: u32) -> RegistryResult<RegisteredSchema> {
        let body: VersionResponse = self.get(subject, Some(version))?;
        Ok(RegisteredSchema::new(body.id, body.schema))
    }
}

/// Map a non-success response to a registry error
fn status_error(subject: &str, version: Option<u32>, status: u16, body: &str) -> RegistryError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) if err.error_code == SUBJECT_NOT_FOUND => {
            RegistryError::SubjectNotFound(subject.to_string())
        }
        Ok(err) if err.error_code == VERSION_NOT_FOUND => match version {
            Some(version) => RegistryError::VersionNotFound {
                subject: subject.to_string(),
                version,
            },
            None => RegistryError::Status {
                status,
                message: err.message,
            },
        },
        Ok(err) => RegistryError::Status {
            status,
            message: err.message,
        },
        Err(_) => RegistryError::Status {
            status,
            message: body.to_string(),
        },
    }
}
