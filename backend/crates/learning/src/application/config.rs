//! Application Configuration

use std::path::PathBuf;

use platform::media::ImageKind;

#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_images: Vec<ImageKind>,
    /// Prefix of the public URL returned for an upload
    pub upload_url_prefix: String,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            allowed_images: ImageKind::ALL.to_vec(),
            upload_url_prefix: "/api/uploads".to_string(),
        }
    }
}

impl LearningConfig {
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn is_allowed(&self, kind: ImageKind) -> bool {
        self.allowed_images.contains(&kind)
    }

    pub fn upload_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.upload_url_prefix.trim_end_matches('/'), file_name)
    }

    /// Request body ceiling for the upload route: the image plus multipart framing
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes + 64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LearningConfig::default();
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert!(config.is_allowed(ImageKind::Webp));
        assert_eq!(config.upload_url("abc.png"), "/api/uploads/abc.png");
    }
}
