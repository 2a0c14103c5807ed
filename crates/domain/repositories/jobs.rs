use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    captions::CaptionEntity,
    highlights::HighlightEntity,
    jobs::{InsertProcessingJobEntity, ProcessingJobEntity},
    thumbnails::ThumbnailEntity,
};

#[async_trait]
#[automock]
pub trait ProcessingJobRepository {
    async fn create_job(&self, insert_job_entity: InsertProcessingJobEntity) -> Result<Uuid>;

    async fn find_job_by_id(&self, job_id: Uuid) -> Result<Option<ProcessingJobEntity>>;

    async fn list_jobs_by_user(&self, user_id: Uuid) -> Result<Vec<ProcessingJobEntity>>;

    async fn update_progress(&self, job_id: Uuid, progress: i32) -> Result<()>;

    /// Terminal transitions only apply to jobs still `processing`; the returned flag says
    /// whether the row changed.
    async fn mark_job_completed(&self, job_id: Uuid) -> Result<bool>;

    async fn mark_job_failed(&self, job_id: Uuid, error_message: String) -> Result<bool>;

    async fn list_highlights(&self, job_id: Uuid) -> Result<Vec<HighlightEntity>>;

    async fn list_thumbnails(&self, job_id: Uuid) -> Result<Vec<ThumbnailEntity>>;

    async fn list_captions(&self, job_id: Uuid) -> Result<Vec<CaptionEntity>>;

    async fn update_highlight_file_path(&self, highlight_id: Uuid, file_path: String)
    -> Result<()>;

    async fn update_thumbnail_file_path(&self, thumbnail_id: Uuid, file_path: String)
    -> Result<()>;

    /// Derived records are removed with the job.
    async fn delete_job(&self, job_id: Uuid) -> Result<usize>;
}
