use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::videos::{InsertVideoEntity, VideoEntity};

#[async_trait]
#[automock]
pub trait VideoRepository {
    async fn find_video_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>>;

    async fn insert_video(&self, insert_video_entity: InsertVideoEntity) -> Result<Uuid>;
}
