use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::highlights;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = highlights)]
pub struct HighlightEntity {
    pub id: Uuid,
    pub job_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = highlights)]
pub struct InsertHighlightEntity {
    pub job_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub confidence: f64,
}
