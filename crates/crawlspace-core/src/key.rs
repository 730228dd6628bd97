//! Object key construction.
//!
//! Object keys are flat strings in the bucket namespace. Dot segments in the
//! relative path are resolved logically, never against a filesystem, and any
//! path that would climb above the dataset root is rejected.

use std::fmt;

use crate::error::TraversalError;
use crate::registry::BucketConfig;

/// Where an object lives in the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
}

impl ObjectLocation {
    /// Resolve `relative_path` inside the dataset described by `config`.
    pub fn resolve(config: &BucketConfig, relative_path: &str) -> Result<Self, TraversalError> {
        Ok(Self {
            bucket: config.bucket_name.clone(),
            key: build_object_key(&config.object_prefix, relative_path)?,
        })
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Join `prefix` and the normalized `relative_path` with a single `/`.
///
/// The separator is omitted when `prefix` is empty. Fails if the path climbs
/// above the dataset root or normalizes to the root itself.
///
/// # Examples
///
/// ```
/// use crawlspace_core::build_object_key;
///
/// assert_eq!(
///     build_object_key("someprefix", "some/./image.jpg").unwrap(),
///     "someprefix/some/image.jpg"
/// );
/// assert!(build_object_key("someprefix", "../secret").is_err());
/// ```
pub fn build_object_key(prefix: &str, relative_path: &str) -> Result<String, TraversalError> {
    let mut stack: Vec<&str> = Vec::new();
    for segment in relative_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(TraversalError {
                        path: relative_path.to_owned(),
                    });
                }
            }
            _ => stack.push(segment),
        }
    }

    // The dataset root itself is not an object.
    if stack.is_empty() {
        return Err(TraversalError {
            path: relative_path.to_owned(),
        });
    }

    let normalized = stack.join("/");
    let prefix = prefix.trim_matches('/');
    Ok(if prefix.is_empty() {
        normalized
    } else {
        format!("{prefix}/{normalized}")
    })
}
