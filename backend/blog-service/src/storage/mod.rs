/// Profile photo storage
///
/// Photos are stored under `<MEDIA_ROOT>/users/` with a random file name and
/// addressed by their path relative to the media root, which is what the
/// `users.photo` column holds.
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::error::{AppError, Result};

const UPLOAD_DIR: &str = "users";

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Persist the bytes and return the stored relative path.
    async fn store(&self, content_type: &mime::Mime, bytes: &[u8]) -> Result<String>;

    /// Remove a stored photo. A path that no longer exists is not an error.
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Writes photos to the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    root: PathBuf,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored relative path, refusing anything that escapes the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::BadRequest(format!("invalid media path: {relative}")));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, content_type: &mime::Mime, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let relative = format!("{}/{}.{}", UPLOAD_DIR, Uuid::new_v4(), extension_for(content_type));
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        tracing::debug!(path = %relative, size = bytes.len(), "stored profile photo");
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path, "photo already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// File extension for an image MIME type.
pub fn extension_for(content_type: &mime::Mime) -> &'static str {
    match content_type.subtype().as_str() {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "bmp" => "bmp",
        "svg" => "svg",
        _ => "img",
    }
}
