use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{
        captions::CaptionEntity, highlights::HighlightEntity, jobs::ProcessingJobEntity,
        thumbnails::ThumbnailEntity,
    },
    value_objects::enums::job_statuses::JobStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub confidence: f64,
}

impl From<HighlightEntity> for HighlightDto {
    fn from(value: HighlightEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            file_path: value.file_path,
            start_time: value.start_time,
            end_time: value.end_time,
            duration: value.duration,
            confidence: value.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThumbnailDto {
    pub id: Uuid,
    pub file_path: String,
    pub timestamp: f64,
    pub confidence: f64,
    pub description: Option<String>,
}

impl From<ThumbnailEntity> for ThumbnailDto {
    fn from(value: ThumbnailEntity) -> Self {
        Self {
            id: value.id,
            file_path: value.file_path,
            timestamp: value.timestamp,
            confidence: value.confidence,
            description: value.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionDto {
    pub id: Uuid,
    pub platform: String,
    pub content: String,
    pub hashtags: Vec<String>,
}

impl From<CaptionEntity> for CaptionDto {
    fn from(value: CaptionEntity) -> Self {
        Self {
            id: value.id,
            platform: value.platform,
            content: value.content,
            hashtags: value.hashtags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub job_id: Uuid,
    #[serde(skip)]
    pub user_id: Option<Uuid>,
    pub video_id: Uuid,
    pub status: JobStatus,
    pub progress: i32,
    pub error_message: Option<String>,
    pub highlights: Vec<HighlightDto>,
    pub thumbnails: Vec<ThumbnailDto>,
    pub captions: Vec<CaptionDto>,
}

impl JobStatusView {
    /// View without artifacts, used for every non-completed job.
    pub fn without_artifacts(job: ProcessingJobEntity) -> Self {
        Self {
            job_id: job.id,
            user_id: job.user_id,
            video_id: job.video_id,
            status: job.job_status(),
            progress: job.progress,
            error_message: job.error_message,
            highlights: Vec::new(),
            thumbnails: Vec::new(),
            captions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummaryDto {
    pub job_id: Uuid,
    pub video_id: Uuid,
    pub status: JobStatus,
    pub progress: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProcessingJobEntity> for JobSummaryDto {
    fn from(value: ProcessingJobEntity) -> Self {
        Self {
            job_id: value.id,
            video_id: value.video_id,
            status: value.job_status(),
            progress: value.progress,
            error_message: value.error_message,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
