//! Image upload and retrieval

use std::sync::Arc;

use platform::crypto::random_token;
use platform::media::{ImageKind, is_safe_file_name};

use crate::application::config::LearningConfig;
use crate::domain::repository::ImageStore;
use crate::error::{LearningError, LearningResult};

/// Bytes of entropy in a generated file name
const FILE_NAME_ENTROPY: usize = 16;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub url: String,
    pub kind: ImageKind,
    pub size: usize,
}

pub struct UploadImageUseCase<I>
where
    I: ImageStore,
{
    images: Arc<I>,
    config: Arc<LearningConfig>,
}

impl<I> UploadImageUseCase<I>
where
    I: ImageStore,
{
    pub fn new(images: Arc<I>, config: Arc<LearningConfig>) -> Self {
        Self { images, config }
    }

    /// Both the declared type and the sniffed content must be allowed
    /// images. The stored name is random; the extension follows the content.
    pub async fn execute(&self, declared_mime: Option<&str>, bytes: &[u8]) -> LearningResult<UploadedImage> {
        let declared = declared_mime
            .and_then(ImageKind::from_mime)
            .filter(|k| self.config.is_allowed(*k))
            .ok_or(LearningError::UnsupportedMediaType)?;

        if bytes.is_empty() {
            return Err(LearningError::BadUpload("empty file".to_string()));
        }
        if bytes.len() > self.config.max_upload_bytes {
            return Err(LearningError::PayloadTooLarge(self.config.max_upload_bytes));
        }

        let kind = ImageKind::sniff(bytes)
            .filter(|k| self.config.is_allowed(*k))
            .ok_or(LearningError::UnsupportedMediaType)?;
        if kind != declared {
            tracing::debug!(declared = declared.mime(), sniffed = kind.mime(), "Declared image type differs from content");
        }

        let file_name = format!("{}.{}", random_token(FILE_NAME_ENTROPY), kind.extension());
        self.images.save_image(&file_name, bytes).await?;

        tracing::info!(file_name = %file_name, mime = kind.mime(), size = bytes.len(), "Image uploaded");

        Ok(UploadedImage {
            url: self.config.upload_url(&file_name),
            file_name,
            kind,
            size: bytes.len(),
        })
    }
}

pub struct ServeImageUseCase<I>
where
    I: ImageStore,
{
    images: Arc<I>,
}

impl<I> ServeImageUseCase<I>
where
    I: ImageStore,
{
    pub fn new(images: Arc<I>) -> Self {
        Self { images }
    }

    /// The content type comes from the stored bytes, not the extension.
    /// Names outside the generated pattern never reach the store.
    pub async fn execute(&self, file_name: &str) -> LearningResult<(ImageKind, Vec<u8>)> {
        if !is_safe_file_name(file_name) {
            return Err(LearningError::NotFound("Image"));
        }

        let bytes = self
            .images
            .load_image(file_name)
            .await?
            .ok_or(LearningError::NotFound("Image"))?;

        let kind = ImageKind::sniff(&bytes).ok_or(LearningError::NotFound("Image"))?;
        Ok((kind, bytes))
    }
}
