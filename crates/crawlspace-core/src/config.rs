//! Configuration management for Crawlspace.
//!
//! All configuration is driven by environment variables. Datasets are given
//! as a JSON object in `DATASETS`; a single bucket can instead be configured
//! with `GCS_BUCKET` and `GCS_OBJECT_PREFIX`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CrawlspaceError, CrawlspaceResult};
use crate::registry::{BucketConfig, BucketRegistry, RegistryState};
use crate::resolver::{DEFAULT_URL_PREFIX, DEFAULT_V2_URL_PREFIX, PathResolver};

/// Dataset key used for the `GCS_BUCKET` single-bucket shorthand.
pub const SINGLE_BUCKET_DATASET: &str = "default";

/// Default Google Cloud Storage JSON API endpoint.
pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogProfile {
    /// JSON log lines.
    #[default]
    Production,
    /// Human-readable log lines.
    Development,
}

impl FromStr for LogProfile {
    type Err = CrawlspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            other => Err(CrawlspaceError::Config(format!(
                "unknown log profile {other:?} (expected production or development)"
            ))),
        }
    }
}

/// Which storage backend serves objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackendKind {
    /// Google Cloud Storage JSON API.
    #[default]
    Gcs,
    /// Local directory tree, one subdirectory per bucket.
    Filesystem,
}

impl FromStr for StorageBackendKind {
    type Err = CrawlspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcs" => Ok(Self::Gcs),
            "filesystem" | "fs" => Ok(Self::Filesystem),
            other => Err(CrawlspaceError::Config(format!(
                "unknown storage backend {other:?} (expected gcs or filesystem)"
            ))),
        }
    }
}

/// Storage backend settings.
#[derive(Clone)]
pub struct StorageSettings {
    /// Backend kind.
    pub backend: StorageBackendKind,
    /// JSON API endpoint for the GCS backend.
    pub gcs_endpoint: String,
    /// Bearer token supplied by the host for the GCS backend.
    pub gcs_access_token: Option<String>,
    /// Project billed for requester-pays reads; unset means the bucket owner pays.
    pub gcs_user_project: Option<String>,
    /// Root directory for the filesystem backend.
    pub filesystem_root: PathBuf,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("backend", &self.backend)
            .field("gcs_endpoint", &self.gcs_endpoint)
            .field("gcs_access_token", &self.gcs_access_token.as_ref().map(|_| "..."))
            .field("gcs_user_project", &self.gcs_user_project)
            .field("filesystem_root", &self.filesystem_root)
            .finish()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            gcs_endpoint: DEFAULT_GCS_ENDPOINT.to_owned(),
            gcs_access_token: None,
            gcs_user_project: None,
            filesystem_root: PathBuf::from("./data"),
        }
    }
}

/// Global configuration for Crawlspace.
#[derive(Debug, Clone)]
pub struct CrawlspaceConfig {
    /// Bind address for the HTTP listener.
    pub gateway_listen: String,
    /// Log level filter.
    pub log_level: String,
    /// Log output format.
    pub log_profile: LogProfile,
    /// Application name, reported by the metadata endpoint.
    pub name: String,
    /// Legacy URL prefix served from the default dataset.
    pub url_prefix: String,
    /// Versioned URL prefix taking a dataset key.
    pub v2_url_prefix: String,
    /// Seconds browsers may cache responses.
    pub cache_max_age: u64,
    /// Storage project.
    pub gcs_project: String,
    /// Dataset key to bucket configuration.
    pub datasets: BTreeMap<String, BucketConfig>,
    /// Default dataset key.
    pub default_dataset: Option<String>,
    /// Storage backend settings.
    pub storage: StorageSettings,
}

impl Default for CrawlspaceConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            log_profile: LogProfile::default(),
            name: "crawlspace".to_owned(),
            url_prefix: DEFAULT_URL_PREFIX.to_owned(),
            v2_url_prefix: DEFAULT_V2_URL_PREFIX.to_owned(),
            cache_max_age: 3600,
            gcs_project: String::new(),
            datasets: BTreeMap::new(),
            default_dataset: None,
            storage: StorageSettings::default(),
        }
    }
}

impl CrawlspaceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> CrawlspaceResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CrawlspaceResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_PROFILE") {
            config.log_profile = v.parse()?;
        }
        if let Some(v) = lookup("SERVICE_NAME") {
            config.name = v;
        }
        if let Some(v) = lookup("URL_PREFIX") {
            config.url_prefix = v;
        }
        if let Some(v) = lookup("V2_URL_PREFIX") {
            config.v2_url_prefix = v;
        }
        if let Some(v) = lookup("CACHE_MAX_AGE") {
            config.cache_max_age = v.trim().parse().map_err(|_| {
                CrawlspaceError::Config(format!("CACHE_MAX_AGE must be a number of seconds: {v}"))
            })?;
        }
        if let Some(v) = lookup("GCS_PROJECT") {
            config.gcs_project = v;
        }

        if let Some(v) = lookup("DATASETS") {
            config.datasets = serde_json::from_str(&v)
                .map_err(|e| CrawlspaceError::Config(format!("invalid DATASETS JSON: {e}")))?;
        } else if let Some(bucket) = lookup("GCS_BUCKET") {
            let prefix = lookup("GCS_OBJECT_PREFIX").unwrap_or_default();
            config.datasets.insert(
                SINGLE_BUCKET_DATASET.to_owned(),
                BucketConfig::new(bucket, prefix),
            );
            config.default_dataset = Some(SINGLE_BUCKET_DATASET.to_owned());
        }
        if let Some(v) = lookup("DEFAULT_DATASET") {
            config.default_dataset = Some(v).filter(|v| !v.is_empty());
        }

        if let Some(v) = lookup("STORAGE_BACKEND") {
            config.storage.backend = v.parse()?;
        }
        if let Some(v) = lookup("GCS_ENDPOINT") {
            config.storage.gcs_endpoint = v;
        }
        if let Some(v) = lookup("GCS_ACCESS_TOKEN") {
            config.storage.gcs_access_token = Some(v).filter(|v| !v.is_empty());
        }
        if let Some(v) = lookup("GCS_USER_PROJECT") {
            config.storage.gcs_user_project = Some(v).filter(|v| !v.is_empty());
        }
        if let Some(v) = lookup("FILESYSTEM_ROOT") {
            config.storage.filesystem_root = PathBuf::from(v);
        }

        Ok(config)
    }

    /// The registry input described by this configuration.
    #[must_use]
    pub fn registry_state(&self) -> RegistryState {
        RegistryState {
            buckets: self.datasets.clone(),
            default_bucket_key: self.default_dataset.clone(),
            gcs_project: self.gcs_project.clone(),
        }
    }

    /// Build and validate the dataset registry.
    pub fn bucket_registry(&self) -> CrawlspaceResult<BucketRegistry> {
        Ok(BucketRegistry::new(self.registry_state())?)
    }

    /// Build the path resolver for the configured prefixes.
    pub fn path_resolver(&self) -> CrawlspaceResult<PathResolver> {
        let resolver = PathResolver::new(&self.url_prefix, &self.v2_url_prefix);
        if resolver.legacy_prefix() == resolver.versioned_prefix() {
            return Err(CrawlspaceError::Config(format!(
                "URL_PREFIX and V2_URL_PREFIX must differ: {}",
                resolver.legacy_prefix()
            )));
        }
        Ok(resolver)
    }
}
