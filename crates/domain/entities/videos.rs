use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::videos;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = videos)]
pub struct VideoEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub file_path: Option<String>,
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = videos)]
pub struct InsertVideoEntity {
    pub user_id: Option<Uuid>,
    pub file_path: Option<String>,
    pub source_url: Option<String>,
    pub title: Option<String>,
}
