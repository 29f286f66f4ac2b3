//! mdpress - Markdown corpus publisher
//!
//! Converts a local corpus of Markdown articles and pages into normalized
//! payloads and synchronizes them to a remote content API, either as a
//! one-shot batch or as a long-running watcher that republishes items as
//! their source files change.
//!
//! # Modules
//!
//! - `content`: the transformation pipeline (skip filtering, path
//!   canonicalization, code-block normalization, link rewriting, payload
//!   assembly)
//! - `source`: the file-backed content store and front matter parsing
//! - `publish`: rate-limited batch delivery and asset synchronization
//! - `watch`: the watch-mode state machine
//! - `api`: the content API client
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Publish items updated in the last five days
//! mdpress publish --api-url http://localhost:8080 --service blog \
//!     --author alice --deploy-assets-dir ./deploy-assets
//!
//! # Republish on every file change
//! mdpress watch --api-url http://localhost:8080 --service blog \
//!     --author alice --deploy-assets-dir ./deploy-assets
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod content;
pub mod credentials;
pub mod publish;
pub mod source;
pub mod watch;

// Re-export main types at crate root for convenience
pub use api::{ApiClient, ApiError, ContentCreated};
pub use config::SiteConfig;
pub use content::{build_payload, Asset, ContentItem, ContentType, Payload};
pub use publish::{ExifImageValidator, ImageValidator, Publisher};
pub use source::{ContentRepository, FileStore, StoreError};
pub use watch::{WatchController, WatchOptions, WatchState};
