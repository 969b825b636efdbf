//! In-memory artifact store (`mem://` locators).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::domain::{ArtifactRef, StoreError};
use crate::ports::ArtifactStore;

/// Keeps blobs in a map behind `mem://artisan/<ulid>` locators.
///
/// Development/test stand-in for object storage; the port is the seam, this
/// is the simplest thing behind it.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn resolve(&self, locator: &ArtifactRef) -> Result<Vec<u8>, StoreError> {
        if locator.scheme() != Some("mem") {
            return Err(StoreError::InvalidLocator(locator.to_string()));
        }
        let blobs = self.blobs.lock().await;
        blobs
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(locator.to_string()))
    }

    async fn store(&self, bytes: Vec<u8>) -> Result<ArtifactRef, StoreError> {
        let locator = ArtifactRef::new(format!("mem://artisan/{}", Ulid::new()));
        let mut blobs = self.blobs.lock().await;
        blobs.insert(locator.as_str().to_string(), bytes);
        Ok(locator)
    }
}
