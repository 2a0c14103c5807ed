use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::UserEntity;

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn clear_subscription(&self, user_id: Uuid) -> Result<()>;

    /// Decrements by one only while the stored balance is still positive; returns the
    /// number of rows updated (0 or 1).
    async fn decrement_credit_if_positive(&self, user_id: Uuid) -> Result<usize>;

    async fn increment_credits(&self, user_id: Uuid, amount: i32) -> Result<usize>;
}
