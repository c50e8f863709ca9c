use std::path::{Component, Path, PathBuf};

use crate::gateway::GatewayError;

/// Blob storage on the local filesystem, laid out as `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base_url, bucket, path)
    }

    // Only plain relative segments; rejects `..`, absolute paths and prefixes.
    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, GatewayError> {
        let relative = Path::new(bucket).join(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(GatewayError::Storage(format!("invalid storage path '{}/{}'", bucket, path)));
        }
        Ok(self.root.join(relative))
    }

    pub async fn put(&self, bucket: &str, path: &str, blob: &[u8]) -> Result<String, GatewayError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                log::error!("Failed to create upload directory: {}", e);
                GatewayError::Storage("failed to create upload directory".to_string())
            })?;
        }
        tokio::fs::write(&target, blob).await.map_err(|e| {
            log::error!("Failed to write file {}: {}", target.display(), e);
            GatewayError::Storage("failed to save file".to_string())
        })?;
        log::info!("Stored {} bytes at {}/{}", blob.len(), bucket, path);
        Ok(self.public_url(bucket, path))
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>, GatewayError> {
        let target = self.resolve(bucket, path)?;
        Ok(tokio::fs::read(&target).await?)
    }

    pub async fn remove(&self, bucket: &str, path: &str) -> Result<(), GatewayError> {
        let target = self.resolve(bucket, path)?;
        tokio::fs::remove_file(&target).await?;
        Ok(())
    }
}
