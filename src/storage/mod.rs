// Blob storage seam
// Uploaded files are staged here before ingestion reads them back by URL


use anyhow::{Context, anyhow};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::Result;

/// Where uploaded course files live until ingestion fetches them
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store bytes under a key and return a URL they can be fetched from
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<Url>;
}

/// Local-filesystem implementation used by the CLI
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[inline]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl BlobStorage for FileStorage {
    #[inline]
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<Url> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(anyhow!("invalid storage key: {key}").into());
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create storage directory {}", parent.display()))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(
            "Stored {} bytes at {} ({})",
            bytes.len(),
            path.display(),
            content_type
        );

        let absolute = tokio::fs::canonicalize(&path)
            .await
            .with_context(|| format!("Failed to resolve {}", path.display()))?;

        Url::from_file_path(&absolute)
            .map_err(|()| anyhow!("storage path {} is not absolute", absolute.display()).into())
    }
}
