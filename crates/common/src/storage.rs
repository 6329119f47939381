//! Storage abstraction for message attachments.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (file name relative to the storage root).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete a file. Deleting a missing file succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.base_path.join(key);

        // The upload directory is created lazily on first write
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.base_path.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Generate a unique storage key for an uploaded file.
///
/// The key is `"{uuid}.{name}"` where `name` is the original file name with
/// any directory components stripped.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("file");

    format!("{}.{}", uuid::Uuid::new_v4(), name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("photo.jpg");
        assert!(key.ends_with(".photo.jpg"));
        assert_eq!(key.len(), 36 + 1 + "photo.jpg".len());
    }

    #[test]
    fn test_generate_storage_key_strips_directories() {
        let key = generate_storage_key("../../etc/passwd");
        assert!(key.ends_with(".passwd"));
        assert!(!key.contains('/'));

        let key = generate_storage_key("C:\\Users\\me\\cat.png");
        assert!(key.ends_with(".cat.png"));
    }

    #[test]
    fn test_generate_storage_key_empty_name() {
        let key = generate_storage_key("dir/");
        assert!(key.ends_with(".file"));
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("sweater-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/files/".to_string());

        let uploaded = storage
            .upload("abc.txt", b"hello", "text/plain")
            .await
            .unwrap();
        assert_eq!(uploaded.url, "/files/abc.txt");
        assert_eq!(uploaded.size, 5);
        assert_eq!(uploaded.md5, "5d41402abc4b2a76b9719d911017c592");
        assert!(dir.join("abc.txt").exists());

        storage.delete("abc.txt").await.unwrap();
        assert!(!dir.join("abc.txt").exists());

        // Already gone
        storage.delete("abc.txt").await.unwrap();

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
