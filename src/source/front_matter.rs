//! YAML front matter extraction.
//!
//! A content file may start with a metadata block between `---` delimiters:
//!
//! ```markdown
//! ---
//! title: My Post
//! date: 2024-01-02 10:00:00
//! tags:
//!   - rust
//! ---
//!
//! Body starts here.
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::content::ExternalResources;

/// Parsed front matter fields. Everything is optional; missing fields fall
/// back at the store layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub tags: Option<OneOrMany>,
    pub noindex: Option<bool>,
    pub series: Option<String>,
    /// Overrides the public path derived from the file location.
    pub permalink: Option<String>,
    pub external_resources: ExternalResources,
}

/// A YAML field that is either a single string or a sequence of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Splits `content` into parsed front matter and the remaining body.
///
/// Missing delimiters yield default metadata and the full content as body.
/// A present but unparseable block is logged and treated as absent, with
/// the body starting after the closing delimiter.
pub fn parse(content: &str) -> (FrontMatter, &str) {
    let Some((yaml, body)) = split(content) else {
        return (FrontMatter::default(), content);
    };
    if yaml.trim().is_empty() {
        return (FrontMatter::default(), body);
    }

    match serde_yaml::from_str(yaml) {
        Ok(meta) => (meta, body),
        Err(e) => {
            warn!("Failed to parse front matter: {e}");
            (FrontMatter::default(), body)
        }
    }
}

fn split(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    if let Some(body) = rest.strip_prefix("---") {
        // empty front matter block
        return Some(("", body.strip_prefix('\n').unwrap_or(body)));
    }

    let closing = rest.find("\n---")?;
    let yaml = &rest[..closing];
    let body = &rest[closing + 4..];
    Some((yaml, body.strip_prefix('\n').unwrap_or(body)))
}

/// Parses the date formats found in front matter.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_front_matter() {
        let content = "---\ntitle: My Post\ndate: 2024-01-02 10:00:00\ntags:\n  - rust\n  - cli\nnoindex: true\n---\n\n# Body\n";
        let (meta, body) = parse(content);

        assert_eq!(meta.title.as_deref(), Some("My Post"));
        assert_eq!(meta.noindex, Some(true));
        assert_eq!(
            meta.tags.unwrap().into_vec(),
            vec!["rust".to_string(), "cli".to_string()]
        );
        assert_eq!(body.trim(), "# Body");
    }

    #[test]
    fn single_tag_string_is_accepted() {
        let (meta, _) = parse("---\ntags: rust\n---\nbody");
        assert_eq!(meta.tags.unwrap().into_vec(), vec!["rust".to_string()]);
    }

    #[test]
    fn no_front_matter_yields_defaults() {
        let (meta, body) = parse("# Just Markdown\n");
        assert!(meta.title.is_none());
        assert_eq!(body, "# Just Markdown\n");
    }

    #[test]
    fn unterminated_block_is_treated_as_body() {
        let content = "---\ntitle: Incomplete\n\nno closing";
        let (meta, body) = parse(content);
        assert!(meta.title.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn invalid_yaml_falls_back_to_defaults() {
        let (meta, body) = parse("---\n{{bad yaml\n---\nbody");
        assert!(meta.title.is_none());
        assert_eq!(body, "body");
    }

    #[test]
    fn external_resources_deserialize() {
        let content =
            "---\nexternal_resources:\n  js:\n    - https://cdn.example.com/x.js\n---\nbody";
        let (meta, _) = parse(content);
        assert_eq!(
            meta.external_resources.js,
            vec!["https://cdn.example.com/x.js".to_string()]
        );
        assert!(meta.external_resources.css.is_empty());
    }

    #[test]
    fn datetime_formats() {
        assert!(parse_datetime("2024-01-02 10:00:00").is_some());
        assert!(parse_datetime("2024-01-02").is_some());
        assert!(parse_datetime("2024-01-02T10:00:00+09:00").is_some());
        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn body_with_dashes_survives() {
        let (meta, body) = parse("---\ntitle: T\n---\nline\n\n---\n\nrule");
        assert_eq!(meta.title.as_deref(), Some("T"));
        assert!(body.contains("---"));
    }
}
