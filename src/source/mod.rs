//! Local content store.
//!
//! Enumerates the Markdown corpus (articles under `_posts/`, pages as
//! `index.md` files), parses front matter into [`ContentItem`]s, and
//! resolves changed files back to items for the watcher.

pub mod front_matter;
pub mod store;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::content::{Asset, ContentItem, ContentType};

pub use store::FileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Narrow query surface over the content corpus.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Items of `kind`, optionally restricted to those updated after `since`.
    async fn list_items(
        &self,
        kind: ContentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, StoreError>;

    /// Resolves a source file path to its content item, trying articles
    /// before pages. `None` when the file does not map to any item.
    async fn find_by_path(
        &self,
        file: &Path,
    ) -> Result<Option<(ContentItem, ContentType)>, StoreError>;

    /// Media assets belonging to `item`.
    async fn assets_for(
        &self,
        item: &ContentItem,
        kind: ContentType,
    ) -> Result<Vec<Asset>, StoreError>;
}
