//! ArtifactStore port: blob storage behind opaque locators.

use async_trait::async_trait;

use crate::domain::{ArtifactRef, StoreError};

/// Exchanges large payloads (images, video) by reference rather than value.
///
/// The coordinator and domain model only ever see locators; bytes live
/// here. v1 ships `impls::MemoryStore`; object storage (GCS/S3) slots in
/// behind the same trait.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetch the bytes behind a locator.
    async fn resolve(&self, locator: &ArtifactRef) -> Result<Vec<u8>, StoreError>;

    /// Persist bytes and return a locator for them.
    async fn store(&self, bytes: Vec<u8>) -> Result<ArtifactRef, StoreError>;
}
