use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::domain::repositories::storage::{FileStorage, is_confined};

/// Media files under a single root; database rows store paths relative to it.
pub struct LocalFileStorage {
    media_root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Creates the root if needed and pins it to its canonical absolute form, so
    /// absolute paths handed back by the renderer can be matched against it.
    pub async fn open(media_root: impl AsRef<Path>) -> Result<Self> {
        let media_root = media_root.as_ref();
        fs::create_dir_all(media_root)
            .await
            .with_context(|| format!("failed to create media root {}", media_root.display()))?;
        let canonical = fs::canonicalize(media_root)
            .await
            .with_context(|| format!("failed to resolve media root {}", media_root.display()))?;

        Ok(Self::new(canonical))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    fn to_relative_path(&self, absolute: &Path) -> Option<String> {
        absolute
            .strip_prefix(&self.media_root)
            .ok()
            .filter(|relative| is_confined(relative))
            .map(|relative| relative.to_string_lossy().replace('\\', "/"))
    }

    fn to_absolute_path(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        is_confined(relative).then(|| self.media_root.join(relative))
    }

    fn job_output_dir(&self, job_id: Uuid) -> PathBuf {
        self.media_root.join("jobs").join(job_id.to_string())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "storage: file already missing");
                Ok(())
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to delete {}", path.display()))
            }
        }
    }

    async fn cleanup_job_files(&self, job_id: Uuid) -> Result<()> {
        let dir = self.job_output_dir(job_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", dir.display()))
            }
        }
    }
}
