//! File-backed content store.
//!
//! Corpus layout:
//!
//! ```text
//! <root>/_config.yml
//! <root>/source/_posts/<name>.md      articles
//! <root>/source/_posts/<name>/...     article asset folder
//! <root>/source/<dir>/index.md        pages
//! <root>/source/<dir>/<media>         page assets
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::{Asset, ContentItem, ContentType};

use super::front_matter::{self, parse_datetime};
use super::{ContentRepository, StoreError};

const POSTS_DIR: &str = "_posts";

/// Content store reading items from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    source_dir: PathBuf,
}

impl FileStore {
    /// Opens the store for a corpus root and its site configuration.
    pub fn open(root: &Path, config: &SiteConfig) -> Self {
        Self::new(root.join(&config.source_dir))
    }

    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir: PathBuf = source_dir.into();
        // canonical paths make change-event resolution prefix checks reliable
        let source_dir = source_dir.canonicalize().unwrap_or(source_dir);
        Self { source_dir }
    }

    /// Directory the watcher observes.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn posts_dir(&self) -> PathBuf {
        self.source_dir.join(POSTS_DIR)
    }

    async fn load_item(&self, file: &Path, public_path: String) -> Result<ContentItem, StoreError> {
        let content = tokio::fs::read_to_string(file).await?;
        let (meta, body) = front_matter::parse(&content);

        let fallback: DateTime<Utc> = tokio::fs::metadata(file).await?.modified()?.into();
        let published_at = meta
            .date
            .as_deref()
            .and_then(parse_datetime)
            .unwrap_or(fallback);
        let updated_at = meta
            .updated
            .as_deref()
            .and_then(parse_datetime)
            .unwrap_or(fallback);

        let title = meta.title.unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(ContentItem {
            path: meta.permalink.unwrap_or(public_path),
            title,
            body: body.to_string(),
            tags: meta.tags.map(|t| t.into_vec()).unwrap_or_default(),
            external_resources: meta.external_resources,
            series: meta.series,
            noindex: meta.noindex,
            published_at,
            updated_at,
            source: file.to_path_buf(),
        })
    }

    async fn list_articles(&self) -> Result<Vec<ContentItem>, StoreError> {
        let posts = self.posts_dir();
        if !posts.is_dir() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut entries = tokio::fs::read_dir(&posts).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if path.extension() != Some(OsStr::new("md")) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            items.push(self.load_item(&path, format!("{stem}/")).await?);
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(items)
    }

    async fn list_pages(&self) -> Result<Vec<ContentItem>, StoreError> {
        let mut items = Vec::new();
        for file in walk_files(&self.source_dir, true).await? {
            if file.file_name() != Some(OsStr::new("index.md")) {
                continue;
            }
            let Some(path) = self.page_path(&file) else {
                continue;
            };
            items.push(self.load_item(&file, path).await?);
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(items)
    }

    /// Public path of a page `index.md`: its directory relative to the
    /// source root, with a trailing slash.
    fn page_path(&self, file: &Path) -> Option<String> {
        let rel = file.parent()?.strip_prefix(&self.source_dir).ok()?;
        if rel.as_os_str().is_empty() {
            return Some(String::new());
        }
        Some(format!("{}/", path_to_slashes(rel)))
    }

    async fn article_assets(&self, item: &ContentItem) -> Result<Vec<Asset>, StoreError> {
        let Some(stem) = item.source.file_stem() else {
            return Ok(Vec::new());
        };
        let folder = self.posts_dir().join(stem);
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let base = item.path.trim_end_matches('/');
        let mut assets = Vec::new();
        for file in walk_files(&folder, false).await? {
            let Ok(rel) = file.strip_prefix(&folder) else {
                continue;
            };
            assets.push(Asset {
                path: format!("{base}/{}", path_to_slashes(rel)),
                source: file,
            });
        }

        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }

    async fn page_assets(&self, item: &ContentItem) -> Result<Vec<Asset>, StoreError> {
        let Some(dir) = item.source.parent() else {
            return Ok(Vec::new());
        };

        let mut assets = Vec::new();
        for file in walk_files(dir, false).await? {
            if file.extension() == Some(OsStr::new("md")) {
                continue;
            }
            let Ok(rel) = file.strip_prefix(&self.source_dir) else {
                continue;
            };
            assets.push(Asset {
                path: path_to_slashes(rel),
                source: file,
            });
        }

        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }
}

#[async_trait]
impl ContentRepository for FileStore {
    async fn list_items(
        &self,
        kind: ContentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let mut items = match kind {
            ContentType::Article => self.list_articles().await?,
            ContentType::Page => self.list_pages().await?,
        };
        if let Some(since) = since {
            items.retain(|item| item.updated_at > since);
        }
        Ok(items)
    }

    async fn find_by_path(
        &self,
        file: &Path,
    ) -> Result<Option<(ContentItem, ContentType)>, StoreError> {
        if !file.exists() || file.extension() != Some(OsStr::new("md")) {
            return Ok(None);
        }
        let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());

        if file.parent() == Some(self.posts_dir().as_path()) {
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                return Ok(None);
            };
            let item = self.load_item(&file, format!("{stem}/")).await?;
            return Ok(Some((item, ContentType::Article)));
        }

        if file.file_name() == Some(OsStr::new("index.md")) && file.starts_with(&self.source_dir) {
            let Some(path) = self.page_path(&file) else {
                return Ok(None);
            };
            let item = self.load_item(&file, path).await?;
            return Ok(Some((item, ContentType::Page)));
        }

        Ok(None)
    }

    async fn assets_for(
        &self,
        item: &ContentItem,
        kind: ContentType,
    ) -> Result<Vec<Asset>, StoreError> {
        match kind {
            ContentType::Article => self.article_assets(item).await,
            ContentType::Page => self.page_assets(item).await,
        }
    }
}

/// Collects all files under `dir`, depth-first. When `skip_underscored` is
/// set, directories starting with `_` (drafts, the posts folder) are not
/// descended into.
async fn walk_files(dir: &Path, skip_underscored: bool) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                if skip_underscored
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('_'))
                {
                    continue;
                }
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn path_to_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
