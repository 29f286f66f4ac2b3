//! Copying of validated media assets into the deployment directory.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::content::{Asset, ContentType};

use super::image_validator::ImageValidator;

/// Destination root for one content type. Article assets live under an
/// `articles/` subtree; page assets keep the deployment root.
pub fn asset_dest_dir(deploy_dir: &Path, content_type: ContentType) -> PathBuf {
    match content_type {
        ContentType::Article => deploy_dir.join("articles"),
        ContentType::Page => deploy_dir.to_path_buf(),
    }
}

/// Copies each valid asset to `dest_dir/asset.path`. Invalid assets and
/// failed copies are logged; neither stops the remaining assets.
pub async fn sync_assets<V: ImageValidator + ?Sized>(
    validator: &V,
    assets: &[Asset],
    dest_dir: &Path,
) {
    for asset in assets {
        if !validator.is_valid(&asset.source).await {
            error!("Image copy skipped - : {}", asset.path);
            continue;
        }

        let dest = dest_dir.join(&asset.path);
        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Image copy failed - dest: {}: {e}", dest.display());
                continue;
            }
        }
        match tokio::fs::copy(&asset.source, &dest).await {
            Ok(_) => info!("Image copied - dest: {}", dest.display()),
            Err(e) => error!("Image copy failed - dest: {}: {e}", dest.display()),
        }
    }
}
