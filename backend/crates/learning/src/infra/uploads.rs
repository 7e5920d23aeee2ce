//! Filesystem image store

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use platform::media::is_safe_file_name;
use tokio::io::AsyncWriteExt;

use crate::domain::repository::ImageStore;
use crate::error::{LearningError, LearningResult};

/// Flat directory of uploaded images
#[derive(Debug, Clone)]
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    /// Create the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> LearningResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file_name: &str) -> Option<PathBuf> {
        is_safe_file_name(file_name).then(|| self.dir.join(file_name))
    }
}

impl ImageStore for FsImageStore {
    async fn save_image(&self, file_name: &str, bytes: &[u8]) -> LearningResult<()> {
        let path = self
            .path(file_name)
            .ok_or_else(|| LearningError::Internal(format!("Refusing file name {file_name:?}")))?;

        // Names are random; an existing file means something is badly wrong
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_image(&self, file_name: &str) -> LearningResult<Option<Vec<u8>>> {
        let Some(path) = self.path(file_name) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> FsImageStore {
        let dir = std::env::temp_dir().join(format!("learning-uploads-{}", uuid::Uuid::new_v4()));
        FsImageStore::open(dir).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = temp_store().await;
        store.save_image("abc_DEF-123.png", b"\x89PNG\r\n\x1a\nrest").await.unwrap();

        let loaded = store.load_image("abc_DEF-123.png").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(&b"\x89PNG\r\n\x1a\nrest"[..]));
        assert!(store.load_image("missing.png").await.unwrap().is_none());

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_names_never_touch_disk() {
        let store = temp_store().await;

        assert!(store.load_image("../../etc/passwd").await.unwrap().is_none());
        assert!(store.save_image("../escape.png", b"x").await.is_err());

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let store = temp_store().await;
        store.save_image("same.gif", b"GIF89a").await.unwrap();

        assert!(matches!(
            store.save_image("same.gif", b"GIF89a").await,
            Err(LearningError::Io(_))
        ));

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }
}
