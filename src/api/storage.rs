//! Public file storage for CMS uploads (product images, hero banners).
//!
//! Files land in a local directory that the router serves under `/uploads`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Filename has no usable characters")]
    InvalidFilename,
    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Absolute URL the storefront can embed.
    pub url: String,
    /// Path relative to the service root, e.g. `/uploads/<name>`.
    pub pathname: String,
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a collision-free name derived from `filename`.
    pub async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let safe_name = sanitize_filename(filename).ok_or(StorageError::InvalidFilename)?;
        let stored_name = format!("{}-{}", Uuid::new_v4(), safe_name);

        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(&stored_name), bytes).await?;

        let pathname = format!("{PUBLIC_PREFIX}/{stored_name}");
        Ok(StoredFile {
            url: format!("{}{}", self.public_base_url, pathname),
            pathname,
        })
    }
}

/// Keeps the final path component, restricted to `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '-').to_string();

    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("hero banner.jpg").as_deref(), Some("hero-banner.jpg"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\photos\\murti.png").as_deref(), Some("murti.png"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[tokio::test]
    async fn test_put_writes_file_and_builds_url() {
        let root = std::env::temp_dir().join(format!("rasdesh-uploads-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&root, "https://vrindavanrasdesh.com");

        let stored = storage.put("diya.png", b"png-bytes").await.expect("stored");

        assert!(stored.pathname.starts_with("/uploads/"));
        assert!(stored.pathname.ends_with("-diya.png"));
        assert_eq!(stored.url, format!("https://vrindavanrasdesh.com{}", stored.pathname));

        let name = stored.pathname.trim_start_matches("/uploads/");
        let written = fs::read(root.join(name)).await.expect("file exists");
        assert_eq!(written, b"png-bytes");

        fs::remove_dir_all(&root).await.expect("cleanup");
    }

    #[tokio::test]
    async fn test_put_rejects_unusable_name() {
        let storage = LocalStorage::new(std::env::temp_dir(), "http://localhost:3000");
        let result = storage.put("...", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidFilename)));
    }
}
