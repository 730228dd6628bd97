//! Media type selection for object responses.

use std::path::Path;

/// FITS images.
const FITS: &str = "application/fits";
/// VOTable documents, the only XML HiPS serves.
const VOTABLE: &str = "application/x-votable+xml";
/// Fallback when nothing else applies.
const FALLBACK: &str = "text/plain";

/// Choose the `Content-Type` for an object.
///
/// Astronomy formats that generic tables get wrong are fixed by extension.
/// Otherwise a specific backend-reported type wins over a guess from the
/// extension. Text types gain a UTF-8 charset unless one is already given.
#[must_use]
pub fn media_type(key: &str, backend_type: Option<&str>) -> String {
    let extension = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let chosen = match extension.as_deref() {
        Some("fits") => FITS.to_owned(),
        Some("xml") => VOTABLE.to_owned(),
        _ => backend_type
            .filter(|t| is_specific(t))
            .map(str::to_owned)
            .or_else(|| mime_guess::from_path(key).first().map(|m| m.to_string()))
            .unwrap_or_else(|| FALLBACK.to_owned()),
    };
    with_charset(chosen)
}

/// Reject empty and catch-all types.
fn is_specific(content_type: &str) -> bool {
    match content_type.parse::<mime::Mime>() {
        Ok(m) => m.essence_str() != mime::APPLICATION_OCTET_STREAM.essence_str(),
        Err(_) => false,
    }
}

fn with_charset(content_type: String) -> String {
    match content_type.parse::<mime::Mime>() {
        Ok(m) if m.type_() == mime::TEXT && m.get_param(mime::CHARSET).is_none() => {
            format!("{content_type}; charset=utf-8")
        }
        _ => content_type,
    }
}
