//! Robots meta directive derivation.

use super::model::ContentType;

const DEFAULT_HEAD_META: &str = "noindex, noarchive, noimageindex, nofollow";

/// Derives the robots meta directive for a content item.
///
/// Pages are always kept out of search indexes; articles are indexable
/// unless the item opts out with `noindex`.
pub fn generate_robots(noindex: Option<bool>, content_type: ContentType) -> &'static str {
    if content_type != ContentType::Article {
        return DEFAULT_HEAD_META;
    }
    if noindex.unwrap_or(false) {
        return DEFAULT_HEAD_META;
    }
    "noarchive, noimageindex"
}
