use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use crates::{
    domain::{
        repositories::videos::VideoRepository, value_objects::videos::RegisterVideoModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::videos::VideoPostgres,
    },
};

use crate::{
    auth::MaybeAuthUser, axum_http::error_responses::AppError, usecases::videos::VideoUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let video_repository = VideoPostgres::new(Arc::clone(&db_pool));

    router(Arc::new(VideoUseCase::new(Arc::new(video_repository))))
}

pub fn router<V>(usecase: Arc<VideoUseCase<V>>) -> Router
where
    V: VideoRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(register::<V>))
        .with_state(usecase)
}

pub async fn register<V>(
    State(usecase): State<Arc<VideoUseCase<V>>>,
    auth: MaybeAuthUser,
    Json(model): Json<RegisterVideoModel>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    let registered = usecase.register(auth.user_id(), model).await?;

    Ok((StatusCode::CREATED, Json(registered)))
}
