use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::submission::errors::DomainError;

/// Media storage seam. Keys are relative paths like `images/<uuid>.jpg`;
/// the publisher reads stored media back when staging it on a public host.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores bytes under `key` and returns the key as persisted.
    async fn store(&self, key: &str, data: Vec<u8>) -> Result<String, DomainError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, DomainError>;

    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}
