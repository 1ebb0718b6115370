//! ArtifactStore: named JSON documents on disk.
//!
//! Storage path: `<artifacts_dir>/<reference>`
//!
//! The presence of a document is the only signal that a step completed.
//! There is no locking: agents running concurrently always write distinct
//! references.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to its on-disk location.
    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }

    pub async fn exists(&self, reference: &str) -> bool {
        fs::metadata(self.path_for(reference))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    pub async fn read(&self, reference: &str) -> Result<serde_json::Value, StoreError> {
        let path = self.path_for(reference);
        let content = fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(reference.to_string())
            } else {
                StoreError::Io {
                    reference: reference.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| StoreError::Serialization {
            reference: reference.to_string(),
            detail: e.to_string(),
        })
    }

    /// Write (or overwrite) a document, creating parent directories.
    pub async fn write(
        &self,
        reference: &str,
        document: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let path = self.path_for(reference);
        let io_err = |e: std::io::Error| StoreError::Io {
            reference: reference.to_string(),
            detail: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(document).map_err(|e| StoreError::Serialization {
            reference: reference.to_string(),
            detail: e.to_string(),
        })?;

        fs::write(&path, json).await.map_err(io_err)?;
        tracing::debug!("[ArtifactStore] Wrote {}", path.display());
        Ok(())
    }

    /// Remove every persisted artifact. Returns `false` if there was nothing to remove.
    pub async fn clean(&self) -> Result<bool, StoreError> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                tracing::info!("[ArtifactStore] Removed {}", self.root.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io {
                reference: self.root.display().to_string(),
                detail: e.to_string(),
            }),
        }
    }
}
