use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};
use domain::{entities::users::UserEntity, repositories::users::UserRepository};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .find(user_id)
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn clear_subscription(&self, user_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::is_subscribed.eq(false),
                users::subscription_expires_at.eq::<Option<DateTime<Utc>>>(None),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn decrement_credit_if_positive(&self, user_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The balance guard lives in the WHERE clause so concurrent spends cannot both win.
        let affected = update(
            users::table
                .filter(users::id.eq(user_id))
                .filter(users::credits.gt(0)),
        )
        .set((
            users::credits.eq(users::credits - 1),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(affected)
    }

    async fn increment_credits(&self, user_id: Uuid, amount: i32) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::credits.eq(users::credits + amount),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
