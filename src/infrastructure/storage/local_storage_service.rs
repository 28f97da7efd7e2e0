use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::submission::errors::DomainError;
use super::traits::StorageService;

/// Filesystem-backed storage rooted at the configured upload directory.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a key under the root, rejecting traversal components.
    fn resolve(&self, key: &str) -> Result<PathBuf, DomainError> {
        let rel = Path::new(key);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(DomainError::Validation(format!("invalid storage key: {key}")));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn store(&self, key: &str, data: Vec<u8>) -> Result<String, DomainError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Infrastructure(format!("mkdir failed: {e}")))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("write {key} failed: {e}")))?;
        debug!("stored media at {}", path.display());
        Ok(key.to_string())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("read {key} failed: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("delete {key} failed: {e}")))
    }
}
