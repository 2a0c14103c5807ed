use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{captions, highlights, jobs, thumbnails},
    },
};
use domain::{
    entities::{
        captions::CaptionEntity,
        highlights::HighlightEntity,
        jobs::{InsertProcessingJobEntity, ProcessingJobEntity},
        thumbnails::ThumbnailEntity,
    },
    repositories::jobs::ProcessingJobRepository,
    value_objects::enums::job_statuses::JobStatus,
};

pub struct ProcessingJobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProcessingJobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProcessingJobRepository for ProcessingJobPostgres {
    async fn create_job(&self, insert_job_entity: InsertProcessingJobEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(jobs::table)
            .values(&insert_job_entity)
            .returning(jobs::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn find_job_by_id(&self, job_id: Uuid) -> Result<Option<ProcessingJobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = jobs::table
            .find(job_id)
            .select(ProcessingJobEntity::as_select())
            .first::<ProcessingJobEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_jobs_by_user(&self, user_id: Uuid) -> Result<Vec<ProcessingJobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = jobs::table
            .filter(jobs::user_id.eq(user_id))
            .order(jobs::created_at.desc())
            .select(ProcessingJobEntity::as_select())
            .load::<ProcessingJobEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_progress(&self, job_id: Uuid, progress: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            jobs::table
                .filter(jobs::id.eq(job_id))
                .filter(jobs::status.eq(JobStatus::Processing.to_string())),
        )
        .set((
            jobs::progress.eq(progress.clamp(0, 100)),
            jobs::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_job_completed(&self, job_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            jobs::table
                .filter(jobs::id.eq(job_id))
                .filter(jobs::status.eq(JobStatus::Processing.to_string())),
        )
        .set((
            jobs::status.eq(JobStatus::Completed.to_string()),
            jobs::progress.eq(100),
            jobs::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn mark_job_failed(&self, job_id: Uuid, error_message: String) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            jobs::table
                .filter(jobs::id.eq(job_id))
                .filter(jobs::status.eq(JobStatus::Processing.to_string())),
        )
        .set((
            jobs::status.eq(JobStatus::Failed.to_string()),
            jobs::error_message.eq(Some(error_message)),
            jobs::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected == 1)
    }

    async fn list_highlights(&self, job_id: Uuid) -> Result<Vec<HighlightEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = highlights::table
            .filter(highlights::job_id.eq(job_id))
            .order((highlights::start_time.asc(), highlights::seq.asc()))
            .select(HighlightEntity::as_select())
            .load::<HighlightEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_thumbnails(&self, job_id: Uuid) -> Result<Vec<ThumbnailEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = thumbnails::table
            .filter(thumbnails::job_id.eq(job_id))
            .order((thumbnails::timestamp.asc(), thumbnails::seq.asc()))
            .select(ThumbnailEntity::as_select())
            .load::<ThumbnailEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_captions(&self, job_id: Uuid) -> Result<Vec<CaptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = captions::table
            .filter(captions::job_id.eq(job_id))
            .order(captions::seq.asc())
            .select(CaptionEntity::as_select())
            .load::<CaptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_highlight_file_path(
        &self,
        highlight_id: Uuid,
        file_path: String,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(highlights::table.filter(highlights::id.eq(highlight_id)))
            .set(highlights::file_path.eq(file_path))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_thumbnail_file_path(
        &self,
        thumbnail_id: Uuid,
        file_path: String,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(thumbnails::table.filter(thumbnails::id.eq(thumbnail_id)))
            .set(thumbnails::file_path.eq(file_path))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = delete(jobs::table.filter(jobs::id.eq(job_id))).execute(&mut conn)?;

        Ok(affected)
    }
}
