//! Immutable dataset registry.
//!
//! A [`BucketRegistry`] maps dataset keys to the bucket and object-key prefix
//! that back them. It is validated once at startup and shared read-only by
//! every request for the lifetime of the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, RegistryError};

/// Storage location for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    /// Name of the backing bucket.
    #[serde(alias = "name")]
    pub bucket_name: String,
    /// Prefix prepended to every object key, without leading or trailing `/`.
    #[serde(default)]
    pub object_prefix: String,
}

impl BucketConfig {
    /// Create a bucket configuration, trimming separators off the prefix.
    #[must_use]
    pub fn new(bucket_name: impl Into<String>, object_prefix: impl AsRef<str>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            object_prefix: normalize_prefix(object_prefix.as_ref()),
        }
    }
}

/// Validated-on-construction configuration input for [`BucketRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    /// Dataset key to bucket configuration.
    pub buckets: BTreeMap<String, BucketConfig>,
    /// Dataset served by the legacy, unscoped URL shape.
    #[serde(default)]
    pub default_bucket_key: Option<String>,
    /// Storage project the buckets belong to.
    #[serde(default)]
    pub gcs_project: String,
}

/// Read-only lookup table from dataset key to [`BucketConfig`].
///
/// # Examples
///
/// ```
/// use crawlspace_core::{BucketConfig, BucketRegistry, RegistryState};
///
/// let mut state = RegistryState::default();
/// state
///     .buckets
///     .insert("ds2".to_owned(), BucketConfig::new("someotherbucket", "someprefix"));
/// state.default_bucket_key = Some("ds2".to_owned());
///
/// let registry = BucketRegistry::new(state).unwrap();
/// assert_eq!(registry.lookup(None).unwrap().bucket_name, "someotherbucket");
/// assert!(registry.lookup(Some("nope")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BucketRegistry {
    state: RegistryState,
}

impl BucketRegistry {
    /// Validate `state` and build the registry.
    pub fn new(mut state: RegistryState) -> Result<Self, RegistryError> {
        for (key, bucket) in &mut state.buckets {
            if key.is_empty() || key.contains('/') {
                return Err(RegistryError::InvalidDatasetKey(key.clone()));
            }
            if bucket.bucket_name.trim().is_empty() {
                return Err(RegistryError::EmptyBucketName(key.clone()));
            }
            bucket.object_prefix = normalize_prefix(&bucket.object_prefix);
        }

        let mut folded: Vec<(String, &str)> = state
            .buckets
            .keys()
            .map(|k| (k.to_ascii_lowercase(), k.as_str()))
            .collect();
        folded.sort();
        if let Some(pair) = folded.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(RegistryError::AmbiguousDatasetKeys {
                first: pair[0].1.to_owned(),
                second: pair[1].1.to_owned(),
            });
        }

        if let Some(default) = &state.default_bucket_key {
            if !state.buckets.contains_key(default) {
                return Err(RegistryError::DefaultDatasetMissing {
                    key: default.clone(),
                    available: join_keys(state.buckets.keys()),
                });
            }
        }

        tracing::debug!(
            datasets = state.buckets.len(),
            default = ?state.default_bucket_key,
            "built dataset registry"
        );

        Ok(Self { state })
    }

    /// Find the bucket configuration for `dataset`, or for the default
    /// dataset when `dataset` is `None`.
    pub fn lookup(&self, dataset: Option<&str>) -> Result<&BucketConfig, LookupError> {
        let key = match dataset {
            Some(key) => key,
            None => self
                .state
                .default_bucket_key
                .as_deref()
                .ok_or(LookupError::NoDefaultDataset)?,
        };

        self.state
            .buckets
            .get(key)
            .ok_or_else(|| LookupError::UnknownDataset {
                key: key.to_owned(),
                available: self.dataset_keys().map(ToOwned::to_owned).collect(),
            })
    }

    /// Configured dataset keys in sorted order.
    pub fn dataset_keys(&self) -> impl Iterator<Item = &str> {
        self.state.buckets.keys().map(String::as_str)
    }

    /// The default dataset key, if configured.
    #[must_use]
    pub fn default_dataset(&self) -> Option<&str> {
        self.state.default_bucket_key.as_deref()
    }

    /// The storage project.
    #[must_use]
    pub fn gcs_project(&self) -> &str {
        &self.state.gcs_project
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_owned()
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}
