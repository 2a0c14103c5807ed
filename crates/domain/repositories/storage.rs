use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait FileStorage {
    /// `None` when `absolute` does not live under the storage root.
    fn to_relative_path(&self, absolute: &Path) -> Option<String>;

    /// `None` when `relative` could resolve outside the storage root.
    fn to_absolute_path(&self, relative: &str) -> Option<PathBuf>;

    fn job_output_dir(&self, job_id: Uuid) -> PathBuf;

    /// Missing files count as deleted.
    async fn delete_file(&self, path: &Path) -> Result<()>;

    async fn cleanup_job_files(&self, job_id: Uuid) -> Result<()>;
}

/// A non-empty path made only of plain components: joined onto a root it stays inside it.
pub fn is_confined(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| matches!(component, Component::Normal(_)))
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
