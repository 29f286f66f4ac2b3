//! Data structures shared by the content pipeline.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a content item. Articles are served under the `/articles` path
/// prefix; pages keep their own path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Page,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Page => "page",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item of the local corpus, as enumerated by the content store.
/// Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Source-relative public path (before canonicalization).
    pub path: String,
    pub title: String,
    /// Raw markdown body, front matter already stripped.
    pub body: String,
    /// Tag names in corpus order.
    pub tags: Vec<String>,
    pub external_resources: ExternalResources,
    pub series: Option<String>,
    pub noindex: Option<bool>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// File this item was loaded from.
    pub source: PathBuf,
}

/// Per-item external script/style URLs declared in front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExternalResources {
    pub js: Vec<String>,
    pub css: Vec<String>,
}

impl ExternalResources {
    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.is_empty()
    }
}

/// A media file belonging to a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute location on disk.
    pub source: PathBuf,
    /// Relative path used for the destination layout.
    pub path: String,
}

/// Wire payload for `POST v1/contents`. Built once per publish attempt;
/// optional fields are serialized only when present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub content_type: ContentType,
    pub path: String,
    pub title: String,
    pub robots_attributes: String,
    pub raw_content: String,
    pub html_content: String,
    pub published_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_resources: Option<Vec<ResourceGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
}

/// Tag reference in a payload: display name plus its URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub name: String,
    pub path: String,
}

/// One group of external resources (`js` or `css`) in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGroup {
    pub kind: String,
    pub values: Vec<String>,
}
