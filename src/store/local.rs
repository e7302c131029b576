use super::ResultStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes objects as files below a root directory, creating parents as needed.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ResultStore for LocalStore {
    async fn put_bytes(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        debug!(path = %path.display(), bytes = body.len(), "Writing file");
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
