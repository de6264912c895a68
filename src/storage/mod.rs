//! Downloads-directory file store
//!
//! The worker is the only writer. Clips are written under a hidden staging
//! name and renamed to `<id>.<ext>` once complete, so the HTTP surface never
//! observes a partial file under a servable name.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create downloads directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write clip data: {0}")]
    Write(std::io::Error),

    #[error("failed to publish clip file: {0}")]
    Publish(std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// File store rooted at the configured downloads directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: root.clone(),
                source,
            })?;

        info!(path = %root.display(), "File store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a staged write for the given job id.
    pub async fn begin(&self, id: Uuid) -> Result<StagingClip> {
        let path = self.staging_path(id);
        let file = File::create(&path).await.map_err(StorageError::Write)?;
        debug!(path = %path.display(), "Staging clip opened");

        Ok(StagingClip {
            file,
            path,
            root: self.root.clone(),
        })
    }

    /// Best-effort removal of a leftover staging file, e.g. after a fetch
    /// was cancelled by the per-job timeout.
    pub async fn discard_staging(&self, id: Uuid) {
        let path = self.staging_path(id);
        if fs::remove_file(&path).await.is_ok() {
            debug!(path = %path.display(), "Staging clip discarded");
        }
    }

    /// Resolve a published clip name to its on-disk path.
    ///
    /// Only simple `<stem>.<ext>` names resolve; separators, `..` and
    /// dot-prefixed (staging) names are rejected so requests can never
    /// escape the downloads directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_valid_clip_name(name) {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Count of published clips, for the health payload.
    pub async fn file_count(&self) -> usize {
        let mut count = 0;
        if let Ok(mut entries) = fs::read_dir(&self.root).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name();
                if !name.to_string_lossy().starts_with('.') {
                    count += 1;
                }
            }
        }
        count
    }

    fn staging_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!(".{id}.part"))
    }
}

/// In-progress clip write, invisible to the serving surface until published.
pub struct StagingClip {
    file: File,
    path: PathBuf,
    root: PathBuf,
}

impl StagingClip {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(StorageError::Write)
    }

    /// Flush to disk and rename into the published `<id>.<ext>` name.
    pub async fn publish(mut self, id: Uuid, ext: &str) -> Result<String> {
        self.file.flush().await.map_err(StorageError::Write)?;
        self.file.sync_all().await.map_err(StorageError::Write)?;
        drop(self.file);

        let file_name = format!("{id}.{ext}");
        let target = self.root.join(&file_name);
        fs::rename(&self.path, &target)
            .await
            .map_err(StorageError::Publish)?;

        info!(file = %file_name, "Clip published");
        Ok(file_name)
    }

    /// Remove the staging file after a failed fetch.
    pub async fn discard(self) {
        let _ = fs::remove_file(&self.path).await;
    }
}

fn is_valid_clip_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
