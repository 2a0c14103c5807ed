use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::captions;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = captions)]
pub struct CaptionEntity {
    pub id: Uuid,
    pub job_id: Uuid,
    pub platform: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = captions)]
pub struct InsertCaptionEntity {
    pub job_id: Uuid,
    pub platform: String,
    pub content: String,
    pub hashtags: Vec<String>,
}
