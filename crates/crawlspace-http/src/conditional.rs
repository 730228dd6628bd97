//! `If-None-Match` handling.

use std::sync::LazyLock;

use http::HeaderMap;
use http::header::IF_NONE_MATCH;
use regex::Regex;
use tracing::warn;

/// One entity tag, strong or weak.
static ETAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:W/)?"([^"\s]+)"$"#).expect("entity tag pattern should compile")
});

/// One list element: a quoted tag (which may itself contain commas) or a
/// bare run up to the next comma.
static LIST_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:W/)?"[^"]*"|[^,\s][^,]*"#).expect("list element pattern should compile")
});

/// Parsed `If-None-Match` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfNoneMatch {
    /// `*`: matches any current representation.
    Any,
    /// Opaque tags, quotes and weak markers removed.
    Tags(Vec<String>),
}

impl IfNoneMatch {
    /// Parse every `If-None-Match` header on a request.
    ///
    /// Elements that are not valid entity tags are skipped with a warning.
    /// Returns `None` when the header is absent or nothing in it parses.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut tags = Vec::new();
        for value in headers.get_all(IF_NONE_MATCH) {
            let Ok(value) = value.to_str() else {
                warn!("ignoring non-ASCII If-None-Match header");
                continue;
            };
            for element in LIST_ELEMENT.find_iter(value) {
                let element = element.as_str().trim_end();
                if element == "*" {
                    return Some(Self::Any);
                }
                match ETAG_PATTERN.captures(element) {
                    Some(caps) => tags.push(caps[1].to_owned()),
                    None => warn!(element, "ignoring invalid entity tag in If-None-Match"),
                }
            }
        }
        (!tags.is_empty()).then_some(Self::Tags(tags))
    }

    /// Whether the object's current etag satisfies the condition, meaning
    /// the client's copy is current.
    ///
    /// Comparison is weak: `W/"x"` and `"x"` both match `x`.
    #[must_use]
    pub fn matches(&self, etag: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Tags(tags) => tags.iter().any(|t| t == etag),
        }
    }
}
