//! Request path resolution.
//!
//! Two URL shapes are routed:
//!
//! - versioned: `<versioned-prefix>/<dataset>/<relative path...>`
//! - legacy: `<legacy-prefix>/<relative path...>`, served from the default dataset
//!
//! With the default prefixes (`/api/hips/v2` and `/api/hips`) the legacy prefix
//! is a textual prefix of the versioned one, so prefixes are tried longest
//! first and only ever match at a segment boundary. Once a prefix matches the
//! request is committed to that shape.

use percent_encoding::percent_decode_str;

use crate::error::ParseError;

/// Default legacy URL prefix.
pub const DEFAULT_URL_PREFIX: &str = "/api/hips";

/// Default versioned URL prefix.
pub const DEFAULT_V2_URL_PREFIX: &str = "/api/hips/v2";

/// A request path split into its dataset and object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// Dataset named in the path; `None` selects the default dataset.
    pub dataset: Option<String>,
    /// Object path relative to the dataset root. Never empty and never
    /// starts with `/`; empty segments are collapsed.
    pub relative_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Versioned,
    Legacy,
}

/// Parses inbound URL paths into [`ResolvedRequest`]s.
#[derive(Debug, Clone)]
pub struct PathResolver {
    legacy_prefix: String,
    versioned_prefix: String,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_URL_PREFIX, DEFAULT_V2_URL_PREFIX)
    }
}

impl PathResolver {
    /// Create a resolver for the given legacy and versioned prefixes.
    ///
    /// Prefixes are normalized to start with `/` and carry no trailing `/`;
    /// `/` itself becomes the empty root prefix.
    #[must_use]
    pub fn new(legacy_prefix: impl AsRef<str>, versioned_prefix: impl AsRef<str>) -> Self {
        Self {
            legacy_prefix: normalize_prefix(legacy_prefix.as_ref()),
            versioned_prefix: normalize_prefix(versioned_prefix.as_ref()),
        }
    }

    /// The normalized legacy prefix.
    #[must_use]
    pub fn legacy_prefix(&self) -> &str {
        &self.legacy_prefix
    }

    /// The normalized versioned prefix.
    #[must_use]
    pub fn versioned_prefix(&self) -> &str {
        &self.versioned_prefix
    }

    /// Resolve a raw (still percent-encoded) request path.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRequest, ParseError> {
        for (shape, prefix) in self.shapes() {
            let Some(rest) = strip_prefix_segment(path, prefix) else {
                continue;
            };
            let mut segments = decode_segments(path, rest)?.into_iter();
            let dataset = match shape {
                Shape::Versioned => Some(
                    segments
                        .next()
                        .ok_or_else(|| ParseError::new(path, "missing dataset key"))?,
                ),
                Shape::Legacy => None,
            };
            let relative_path = segments.collect::<Vec<_>>().join("/");
            if relative_path.is_empty() {
                return Err(ParseError::new(path, "empty object path"));
            }
            return Ok(ResolvedRequest {
                dataset,
                relative_path,
            });
        }

        Err(ParseError::new(path, "no route matches the path"))
    }

    /// Shapes in matching order: longest prefix first, versioned on a tie.
    fn shapes(&self) -> [(Shape, &str); 2] {
        let versioned = (Shape::Versioned, self.versioned_prefix.as_str());
        let legacy = (Shape::Legacy, self.legacy_prefix.as_str());
        if self.legacy_prefix.len() > self.versioned_prefix.len() {
            [legacy, versioned]
        } else {
            [versioned, legacy]
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Strip `prefix` from `path` only if it ends at a segment boundary.
fn strip_prefix_segment<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Percent-decode the remainder of a path and split it into non-empty segments.
fn decode_segments(path: &str, rest: &str) -> Result<Vec<String>, ParseError> {
    let decoded = percent_decode_str(rest)
        .decode_utf8()
        .map_err(|_| ParseError::new(path, "path is not valid UTF-8"))?;
    if decoded.contains('\0') {
        return Err(ParseError::new(path, "path contains a NUL byte"));
    }
    Ok(decoded
        .split('/')
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}
