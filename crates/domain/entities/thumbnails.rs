use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::thumbnails;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = thumbnails)]
pub struct ThumbnailEntity {
    pub id: Uuid,
    pub job_id: Uuid,
    pub file_path: String,
    pub timestamp: f64,
    pub confidence: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = thumbnails)]
pub struct InsertThumbnailEntity {
    pub job_id: Uuid,
    pub file_path: String,
    pub timestamp: f64,
    pub confidence: f64,
    pub description: Option<String>,
}
