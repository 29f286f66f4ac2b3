//! Assembly of the wire payload for one content item.

use super::codeblock::format_code_blocks;
use super::external_link::rewrite_external_links;
use super::markdown::render_markdown;
use super::model::{ContentItem, ContentType, Payload, ResourceGroup, TagRef};
use super::path::format_path;
use super::robots::generate_robots;
use super::skip::should_skip;
use super::template::strip_template_syntax;

/// Builds the publish payload for `item`, or `None` when the item's path
/// matches the skip patterns. Optional payload fields are populated only
/// when they carry a value.
pub fn build_payload<S: AsRef<str>>(
    item: &ContentItem,
    content_type: ContentType,
    base_url: &str,
    skip_patterns: &[S],
) -> Option<Payload> {
    if should_skip(&item.path, skip_patterns) {
        return None;
    }

    let path = format_path(&item.path, content_type);
    let raw = strip_template_syntax(&item.body);
    let rendered = render_markdown(&format_code_blocks(&raw));
    let html = rewrite_external_links(&rendered, base_url);

    let tags = if item.tags.is_empty() {
        None
    } else {
        Some(
            item.tags
                .iter()
                .map(|name| TagRef {
                    name: name.clone(),
                    path: tag_path(name),
                })
                .collect(),
        )
    };

    let mut resources = Vec::new();
    if !item.external_resources.js.is_empty() {
        resources.push(ResourceGroup {
            kind: "js".to_string(),
            values: item.external_resources.js.clone(),
        });
    }
    if !item.external_resources.css.is_empty() {
        resources.push(ResourceGroup {
            kind: "css".to_string(),
            values: item.external_resources.css.clone(),
        });
    }
    let external_resources = if resources.is_empty() {
        None
    } else {
        Some(resources)
    };

    let series = item
        .series
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(Payload {
        content_type,
        path,
        title: item.title.clone(),
        robots_attributes: generate_robots(item.noindex, content_type).to_string(),
        raw_content: raw,
        html_content: html,
        published_at: item.published_at.timestamp(),
        updated_at: item.updated_at.timestamp(),
        tags,
        external_resources,
        series,
    })
}

/// URL slug for a tag name: spaces become hyphens, apostrophes are dropped.
fn tag_path(name: &str) -> String {
    name.replace(' ', "-").replace('\'', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::ExternalResources;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn item(path: &str) -> ContentItem {
        ContentItem {
            path: path.to_string(),
            title: "A post".to_string(),
            body: "Hello **world**".to_string(),
            tags: Vec::new(),
            external_resources: ExternalResources::default(),
            series: None,
            noindex: None,
            published_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_100_000, 0).unwrap(),
            source: PathBuf::from("source/_posts/a-post.md"),
        }
    }

    #[test]
    fn builds_a_minimal_article_payload() {
        let payload = build_payload(&item("a-post/"), ContentType::Article, "https://example.com", &["temp/**"]).unwrap();

        assert_eq!(payload.path, "/articles/a-post/");
        assert_eq!(payload.robots_attributes, "noarchive, noimageindex");
        assert_eq!(payload.published_at, 1_700_000_000);
        assert_eq!(payload.updated_at, 1_700_100_000);
        assert!(payload.html_content.contains("<strong>world</strong>"));
        assert!(payload.tags.is_none());
        assert!(payload.external_resources.is_none());
        assert!(payload.series.is_none());
    }

    #[test]
    fn skip_matched_items_build_nothing() {
        assert!(build_payload(
            &item("temp/scratch/"),
            ContentType::Article,
            "https://example.com",
            &["temp/**"]
        )
        .is_none());
    }

    #[test]
    fn tags_map_to_slugged_refs() {
        let mut it = item("a-post/");
        it.tags = vec!["Rust Lang".to_string(), "O'Reilly".to_string()];
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();

        let tags = payload.tags.unwrap();
        assert_eq!(
            tags,
            vec![
                TagRef {
                    name: "Rust Lang".to_string(),
                    path: "Rust-Lang".to_string()
                },
                TagRef {
                    name: "O'Reilly".to_string(),
                    path: "OReilly".to_string()
                },
            ]
        );
    }

    #[test]
    fn external_resources_appear_only_when_present() {
        let mut it = item("a-post/");
        it.external_resources = ExternalResources {
            js: vec!["https://cdn.example.com/x.js".to_string()],
            css: Vec::new(),
        };
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();

        let groups = payload.external_resources.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, "js");
        assert_eq!(groups[0].values, vec!["https://cdn.example.com/x.js"]);
    }

    #[test]
    fn blank_series_is_absent() {
        let mut it = item("a-post/");
        it.series = Some("   ".to_string());
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();
        assert!(payload.series.is_none());

        it.series = Some("rust-intro".to_string());
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();
        assert_eq!(payload.series.as_deref(), Some("rust-intro"));
    }

    #[test]
    fn template_markers_are_stripped_from_raw_content() {
        let mut it = item("a-post/");
        it.body = "{% raw %}{{ keep }}{% endraw %}".to_string();
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();
        assert_eq!(payload.raw_content, "{{ keep }}");
    }

    #[test]
    fn external_links_in_rendered_html_open_in_new_tab() {
        let mut it = item("a-post/");
        it.body = "[ext](https://example.org/)".to_string();
        let payload =
            build_payload(&it, ContentType::Article, "https://example.com", &["temp/**"]).unwrap();
        assert!(payload.html_content.contains(r#"target="_blank""#));
    }
}
