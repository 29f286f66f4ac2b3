//! Batch and single-item delivery of content payloads.
//!
//! Delivery is strictly sequential with a fixed inter-item delay: a simple
//! client-side rate limit against the API, not a retry backoff. A failed
//! item is logged and the batch continues; there are no retries within a
//! run. Assets are synchronized only after their item's publish call has
//! returned success.

pub mod assets;
pub mod image_validator;

use std::path::Path;
use std::time::Duration;

use tracing::{error, info};

use crate::api::{ApiClient, ApiError, ContentCreated};
use crate::content::{build_payload, ContentItem, ContentType, Payload};
use crate::source::ContentRepository;

pub use image_validator::{ExifImageValidator, ImageValidator};

/// Fixed delay between consecutive publish attempts in a batch.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(150);

/// Drives payload building and API delivery for a content batch.
pub struct Publisher<'a, R, V> {
    client: &'a ApiClient,
    repo: &'a R,
    validator: &'a V,
    base_url: &'a str,
    skip_patterns: &'a [String],
    deploy_assets_dir: &'a Path,
}

impl<'a, R: ContentRepository, V: ImageValidator> Publisher<'a, R, V> {
    pub fn new(
        client: &'a ApiClient,
        repo: &'a R,
        validator: &'a V,
        base_url: &'a str,
        skip_patterns: &'a [String],
        deploy_assets_dir: &'a Path,
    ) -> Self {
        Self {
            client,
            repo,
            validator,
            base_url,
            skip_patterns,
            deploy_assets_dir,
        }
    }

    /// Publishes `items` sequentially. Skip-matched items are passed over
    /// without counting or delaying; every other item is attempted exactly
    /// once and followed by the rate-limit delay, success or not.
    ///
    /// Returns the number of attempted items. The running number in the
    /// success log counts successes only.
    pub async fn publish_batch(&self, items: &[ContentItem], content_type: ContentType) -> usize {
        let mut attempted = 0;
        let mut published = 0;

        for item in items {
            let Some(payload) =
                build_payload(item, content_type, self.base_url, self.skip_patterns)
            else {
                continue;
            };
            attempted += 1;

            match self.deliver(&payload).await {
                Ok(created) => {
                    published += 1;
                    info!(
                        "{content_type} published - {published}: {} - {}",
                        created.id, created.path
                    );
                    self.sync_item_assets(item, content_type).await;
                }
                Err(e) => {
                    error!("{content_type} publish failed: {} - {e}", payload.path);
                }
            }

            tokio::time::sleep(RATE_LIMIT_DELAY).await;
        }

        attempted
    }

    /// Publishes one item, as the watcher does on a change event. No
    /// rate-limit delay. Returns the created record on success.
    pub async fn publish_item(
        &self,
        item: &ContentItem,
        content_type: ContentType,
    ) -> Option<ContentCreated> {
        let payload = build_payload(item, content_type, self.base_url, self.skip_patterns)?;

        match self.deliver(&payload).await {
            Ok(created) => {
                info!("{content_type} published: {} - {}", created.id, created.path);
                self.sync_item_assets(item, content_type).await;
                Some(created)
            }
            Err(e) => {
                error!("{content_type} publish failed: {} - {e}", payload.path);
                None
            }
        }
    }

    async fn deliver(&self, payload: &Payload) -> Result<ContentCreated, ApiError> {
        self.client.create_content(payload).await
    }

    async fn sync_item_assets(&self, item: &ContentItem, content_type: ContentType) {
        let item_assets = match self.repo.assets_for(item, content_type).await {
            Ok(item_assets) => item_assets,
            Err(e) => {
                error!("Asset listing failed for {}: {e}", item.path);
                return;
            }
        };
        let dest = assets::asset_dest_dir(self.deploy_assets_dir, content_type);
        assets::sync_assets(self.validator, &item_assets, &dest).await;
    }
}
