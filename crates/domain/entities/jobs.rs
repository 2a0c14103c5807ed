use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::job_statuses::JobStatus,
    infra::db::postgres::schema::jobs,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = jobs)]
pub struct ProcessingJobEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub video_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJobEntity {
    /// Unknown stored values read as `Failed`.
    pub fn job_status(&self) -> JobStatus {
        self.status.parse().unwrap_or(JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = jobs)]
pub struct InsertProcessingJobEntity {
    pub user_id: Option<Uuid>,
    pub video_id: Uuid,
    pub status: String,
    pub progress: i32,
}

impl InsertProcessingJobEntity {
    pub fn processing(video_id: Uuid, user_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            video_id,
            status: JobStatus::Processing.to_string(),
            progress: 0,
        }
    }
}
