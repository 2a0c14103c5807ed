use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::users;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: Option<String>,
    pub credits: i32,
    pub is_subscribed: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    /// A subscription without an expiry never lapses.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.is_subscribed
            && self
                .subscription_expires_at
                .is_none_or(|expires_at| expires_at > now)
    }

    pub fn subscription_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.is_subscribed
            && self
                .subscription_expires_at
                .is_some_and(|expires_at| expires_at <= now)
    }
}
