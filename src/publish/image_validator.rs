//! Image validation gate for asset deployment.
//!
//! Images carrying EXIF GPS metadata must never reach the public asset
//! directory. Files whose extension cannot carry EXIF data pass through
//! without inspection.

use std::io::BufReader;
use std::path::Path;

use async_trait::async_trait;
use tracing::{error, warn};

/// Extensions copied without EXIF inspection.
const PASS_EXTENSIONS: &[&str] = &[
    "md", "mermaid", "mp3", "mp4", "webm", "pptx", "svg", "txt", "ico", "gif",
];

const GPS_TAGS: &[exif::Tag] = &[
    exif::Tag::GPSVersionID,
    exif::Tag::GPSLatitudeRef,
    exif::Tag::GPSLatitude,
    exif::Tag::GPSLongitudeRef,
    exif::Tag::GPSLongitude,
    exif::Tag::GPSAltitudeRef,
    exif::Tag::GPSAltitude,
    exif::Tag::GPSTimeStamp,
    exif::Tag::GPSDateStamp,
    exif::Tag::GPSMapDatum,
    exif::Tag::GPSProcessingMethod,
];

/// Decides whether an asset may be copied to the deployment directory.
#[async_trait]
pub trait ImageValidator: Send + Sync {
    async fn is_valid(&self, source: &Path) -> bool;
}

/// Validator that rejects images with GPS metadata in their EXIF block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifImageValidator;

#[async_trait]
impl ImageValidator for ExifImageValidator {
    async fn is_valid(&self, source: &Path) -> bool {
        if has_pass_extension(source) {
            return true;
        }

        let path = source.to_path_buf();
        match tokio::task::spawn_blocking(move || inspect(&path)).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Image validation task failed: {e}");
                false
            }
        }
    }
}

fn has_pass_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PASS_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
        .unwrap_or(false)
}

fn inspect(path: &Path) -> bool {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open image {}: {e}", path.display());
            return false;
        }
    };

    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(data) => {
            let has_gps = GPS_TAGS
                .iter()
                .any(|&tag| data.get_field(tag, exif::In::PRIMARY).is_some());
            if has_gps {
                warn!("GPS metadata found in {}", path.display());
            }
            !has_gps
        }
        // a file without EXIF data has nothing to leak
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => true,
        Err(e) => {
            warn!("EXIF read failed for {}: {e}", path.display());
            false
        }
    }
}
