use std::sync::Arc;

use crates::domain::{
    entities::videos::InsertVideoEntity,
    repositories::videos::VideoRepository,
    value_objects::videos::{
        RegisterVideoModel, VideoSource, normalize_title, normalize_video_source,
    },
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::processing::{ProcessingError, ProcessingResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRegistered {
    pub video_id: Uuid,
}

pub struct VideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    video_repo: Arc<V>,
}

impl<V> VideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    pub fn new(video_repo: Arc<V>) -> Self {
        Self { video_repo }
    }

    pub async fn register(
        &self,
        user_id: Option<Uuid>,
        model: RegisterVideoModel,
    ) -> ProcessingResult<VideoRegistered> {
        let source = normalize_video_source(&model).map_err(|err| {
            warn!(?user_id, error = %err, "videos: invalid video reference");
            ProcessingError::InvalidVideo(err.to_string())
        })?;
        let title = normalize_title(&model.title)
            .map_err(|err| ProcessingError::InvalidVideo(err.to_string()))?;

        let (file_path, source_url) = match source {
            VideoSource::Stored(path) => (Some(path), None),
            VideoSource::Remote(url) => (None, Some(url)),
        };

        let video_id = self
            .video_repo
            .insert_video(InsertVideoEntity {
                user_id,
                file_path,
                source_url,
                title,
            })
            .await
            .map_err(|err| {
                error!(?user_id, db_error = ?err, "videos: failed to register video");
                ProcessingError::Internal(err)
            })?;

        info!(%video_id, ?user_id, "videos: video registered");
        Ok(VideoRegistered { video_id })
    }
}
