//! Canonicalization of raw content paths into public URL paths.

use super::model::ContentType;

/// Formats a raw corpus path into the public URL path.
///
/// A trailing `index.html` is dropped, the result always starts and ends
/// with `/`, and article paths gain a `/articles` prefix unless they already
/// carry one. An empty input formats to `/articles/` for articles and `/`
/// for pages.
pub fn format_path(path: &str, content_type: ContentType) -> String {
    let mut p = path.to_string();

    if let Some(stripped) = p.strip_suffix("index.html/") {
        p = stripped.to_string();
    } else if let Some(stripped) = p.strip_suffix("index.html") {
        p = stripped.to_string();
    }

    if !p.ends_with('/') {
        p.push('/');
    }
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    if content_type == ContentType::Article && !p.contains("/articles") {
        p = format!("/articles{p}");
    }
    p
}
