//! Glob-based exclusion of content paths from publishing.

use glob::{MatchOptions, Pattern};

/// Returns true when `path` matches any of the skip patterns.
///
/// `*` matches within a single path segment, `**` crosses segments. Two
/// extensions over plain glob matching: `dir/**` also covers the bare `dir`
/// itself, and `**/seg` covers a path that is exactly `seg` or ends with the
/// segment `seg`. Leading and trailing slashes are insignificant on both
/// sides.
pub fn should_skip<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    let path = path.trim_matches('/');
    patterns
        .iter()
        .any(|p| pattern_matches(path, p.as_ref().trim_matches('/')))
}

fn pattern_matches(path: &str, pattern: &str) -> bool {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };

    if let Ok(glob) = Pattern::new(pattern) {
        if glob.matches_with(path, options) {
            return true;
        }
    }

    // `dir/**` also matches the directory itself
    if let Some(prefix) = pattern.strip_suffix("/**") {
        if path == prefix || path.starts_with(&format!("{prefix}/")) {
            return true;
        }
    }

    // `**/seg` also matches a path equal to or ending in that segment
    if let Some(segment) = pattern.strip_prefix("**/") {
        if path == segment || path.ends_with(&format!("/{segment}")) {
            return true;
        }
    }

    false
}
