//! Store photo uploads: type check, downscale, write to disk.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{DomainError, PHOTO_MAX_WIDTH};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const UNSUPPORTED_FILETYPE: &str = "That filetype isn't allowed!";

/// An uploaded file held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File-storage capability for store photos.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Persist the upload and return its stored filename.
    async fn save(&self, upload: PhotoUpload) -> AppResult<String>;
}

/// Map a MIME type to a format we can both decode and re-encode.
pub fn accepted_format(content_type: &str) -> Result<ImageFormat, DomainError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        return Err(DomainError::UnsupportedMediaType(UNSUPPORTED_FILETYPE.to_string()));
    }

    ImageFormat::from_mime_type(&content_type)
        .filter(|format| format.reading_enabled() && format.writing_enabled())
        .ok_or_else(|| DomainError::UnsupportedMediaType(UNSUPPORTED_FILETYPE.to_string()))
}

/// Scale `image` down to `max_width`, keeping its aspect ratio. Never upscales.
pub fn fit_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    if image.width() <= max_width {
        return image;
    }
    image.resize(max_width, u32::MAX, FilterType::Triangle)
}

fn process(bytes: &[u8], format: ImageFormat) -> AppResult<Vec<u8>> {
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|_| AppError::validation("The uploaded photo could not be read"))?;

    let mut resized = fit_width(decoded, PHOTO_MAX_WIDTH);
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel
        resized = DynamicImage::ImageRgb8(resized.to_rgb8());
    }

    let mut encoded = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut encoded), format)
        .map_err(|e| AppError::internal(format!("Photo encode failed: {}", e)))?;
    Ok(encoded)
}

/// Writes photos as `<uuid>.<ext>` under a local directory.
pub struct LocalPhotoStorage {
    upload_dir: PathBuf,
}

impl LocalPhotoStorage {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn save(&self, upload: PhotoUpload) -> AppResult<String> {
        let format = accepted_format(&upload.content_type)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        let encoded = tokio::task::spawn_blocking(move || process(&upload.bytes, format))
            .await
            .map_err(|e| AppError::internal(format!("Photo processing task failed: {}", e)))??;

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::internal(format!("Cannot create upload dir: {}", e)))?;
        tokio::fs::write(self.upload_dir.join(&filename), encoded)
            .await
            .map_err(|e| AppError::internal(format!("Cannot write photo: {}", e)))?;

        tracing::debug!(%filename, "Stored store photo");
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_image_types() {
        assert_eq!(accepted_format("image/png").unwrap(), ImageFormat::Png);
        assert_eq!(accepted_format("image/jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(accepted_format("IMAGE/GIF").unwrap(), ImageFormat::Gif);
    }

    #[test]
    fn test_rejects_non_images() {
        for mime in ["application/pdf", "text/plain", "image/x-unknown"] {
            assert_eq!(
                accepted_format(mime),
                Err(DomainError::UnsupportedMediaType(UNSUPPORTED_FILETYPE.to_string()))
            );
        }
    }

    #[test]
    fn test_fit_width_scales_down_keeping_ratio() {
        let resized = fit_width(DynamicImage::new_rgb8(1600, 1000), 800);
        assert_eq!((resized.width(), resized.height()), (800, 500));
    }

    #[test]
    fn test_fit_width_never_upscales() {
        let resized = fit_width(DynamicImage::new_rgb8(300, 200), 800);
        assert_eq!((resized.width(), resized.height()), (300, 200));
    }
}
