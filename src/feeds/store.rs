use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Source of raw feed blobs, addressed by object name
/// (e.g. `draftables/draftkings/nfl/main.json`).
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, object: &str) -> Result<Vec<u8>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Object names come from request parameters; refuse anything that could
/// escape the store root.
pub fn validate_object_name(object: &str) -> Result<()> {
    if object.is_empty() {
        anyhow::bail!("empty object name");
    }
    let ok = Path::new(object)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        anyhow::bail!("invalid object name '{}'", object);
    }
    Ok(())
}

/// Feed blobs laid out under a local directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalBlobStore { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self, object: &str) -> Result<Vec<u8>> {
        validate_object_name(object)?;
        let path = self.root.join(object);
        debug!("Reading feed blob {}", path.display());
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}
