use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::repositories::{
        analyzer::VideoAnalyzer, jobs::ProcessingJobRepository, storage::FileStorage,
        transaction::TransactionRepository, users::UserRepository, videos::VideoRepository,
    },
    infra::{
        analyzer::http_analyzer::HttpVideoAnalyzer,
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                jobs::ProcessingJobPostgres, transaction::TransactionPostgres, users::UserPostgres,
                videos::VideoPostgres,
            },
        },
        storages::local_storage::LocalFileStorage,
    },
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, MaybeAuthUser},
    axum_http::error_responses::AppError,
    usecases::{
        credit_ledger::CreditLedger, job_status::JobStatusUseCase, job_tasks::JobTaskRegistry,
        processing::ProcessingUseCase,
    },
};

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub video_id: Uuid,
}

pub struct JobsState<V, J, T, U, A, S>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    pub processing: ProcessingUseCase<V, J, T, U, A, S>,
    pub status: JobStatusUseCase<J, S>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    analyzer: Arc<HttpVideoAnalyzer>,
    storage: Arc<LocalFileStorage>,
    tasks: Arc<JobTaskRegistry>,
) -> Router {
    let video_repository = Arc::new(VideoPostgres::new(Arc::clone(&db_pool)));
    let job_repository = Arc::new(ProcessingJobPostgres::new(Arc::clone(&db_pool)));
    let transaction_repository = Arc::new(TransactionPostgres::new(Arc::clone(&db_pool)));
    let credit_ledger = Arc::new(CreditLedger::new(Arc::new(UserPostgres::new(
        Arc::clone(&db_pool),
    ))));

    let processing = ProcessingUseCase::new(
        video_repository,
        Arc::clone(&job_repository),
        transaction_repository,
        credit_ledger,
        analyzer,
        Arc::clone(&storage),
        tasks,
    );
    let status = JobStatusUseCase::new(job_repository, storage);

    router(Arc::new(JobsState { processing, status }))
}

pub fn router<V, J, T, U, A, S>(state: Arc<JobsState<V, J, T, U, A, S>>) -> Router
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/",
            post(start_job::<V, J, T, U, A, S>).get(list_jobs::<V, J, T, U, A, S>),
        )
        .route(
            "/:job_id",
            get(job_status::<V, J, T, U, A, S>).delete(delete_job::<V, J, T, U, A, S>),
        )
        .with_state(state)
}

pub async fn start_job<V, J, T, U, A, S>(
    State(state): State<Arc<JobsState<V, J, T, U, A, S>>>,
    auth: MaybeAuthUser,
    Json(request): Json<StartJobRequest>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    let created = state
        .processing
        .start_processing(request.video_id, auth.user_id())
        .await?;

    Ok((StatusCode::ACCEPTED, Json(created)))
}

pub async fn job_status<V, J, T, U, A, S>(
    State(state): State<Arc<JobsState<V, J, T, U, A, S>>>,
    auth: MaybeAuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    let view = state.status.get_status_for(job_id, auth.user_id()).await?;

    Ok(Json(view))
}

pub async fn list_jobs<V, J, T, U, A, S>(
    State(state): State<Arc<JobsState<V, J, T, U, A, S>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    info!(%user_id, "jobs: list requested");
    let jobs = state.status.list_jobs(user_id).await?;

    Ok(Json(jobs))
}

pub async fn delete_job<V, J, T, U, A, S>(
    State(state): State<Arc<JobsState<V, J, T, U, A, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    state.status.delete_job(job_id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{AuthConfig, Claims},
        usecases::test_support::{InMemoryStore, RecordingStorage, StubAnalyzer, analysis},
    };
    use axum::{
        Extension,
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    struct TestApp {
        app: Router,
        store: Arc<InMemoryStore>,
        tasks: Arc<JobTaskRegistry>,
    }

    fn test_app(analyzer: StubAnalyzer) -> TestApp {
        let store = Arc::new(InMemoryStore::new());
        let storage = Arc::new(RecordingStorage::new());
        let tasks = Arc::new(JobTaskRegistry::new(2));

        let processing = ProcessingUseCase::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(CreditLedger::new(Arc::clone(&store))),
            Arc::new(analyzer),
            Arc::clone(&storage),
            Arc::clone(&tasks),
        );
        let status = JobStatusUseCase::new(Arc::clone(&store), storage);

        let app = Router::new()
            .nest(
                "/api/v1/jobs",
                router(Arc::new(JobsState { processing, status })),
            )
            .layer(Extension(AuthConfig::new(SECRET)));

        TestApp { app, store, tasks }
    }

    fn bearer(user_id: Uuid) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            exp: 9999999999,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    fn start_request(video_id: Uuid, user_id: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/jobs")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header(header::AUTHORIZATION, bearer(user_id));
        }
        builder
            .body(Body::from(json!({ "video_id": video_id }).to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn start_returns_accepted_and_status_becomes_completed() {
        let t = test_app(StubAnalyzer::returning(analysis(2, 1, 1)));
        let user_id = t.store.seed_user(2, false, None);
        let video_id = t.store.seed_video(Some(user_id));

        let response = t
            .app
            .clone()
            .oneshot(start_request(video_id, Some(user_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let job_id: Uuid = json_body(response).await["job_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        t.tasks.wait(job_id).await;

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/jobs/{job_id}"))
                    .header(header::AUTHORIZATION, bearer(user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["progress"], 100);
        assert_eq!(body["highlights"].as_array().unwrap().len(), 2);
        assert!(body.get("user_id").is_none());
    }

    #[tokio::test]
    async fn denied_credit_check_is_payment_required() {
        let t = test_app(StubAnalyzer::returning(analysis(1, 0, 0)));
        let user_id = t.store.seed_user(0, false, None);
        let video_id = t.store.seed_video(Some(user_id));

        let response = t
            .app
            .oneshot(start_request(video_id, Some(user_id)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = json_body(response).await;
        assert_eq!(body["code"], 402);
        assert_eq!(body["message"], "payment required: insufficient credits");
        assert_eq!(t.store.job_count(), 0);
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let t = test_app(StubAnalyzer::returning(analysis(1, 0, 0)));

        let response = t
            .app
            .oneshot(start_request(Uuid::new_v4(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_token_is_rejected_instead_of_treated_as_anonymous() {
        let t = test_app(StubAnalyzer::returning(analysis(1, 0, 0)));
        let video_id = t.store.seed_video(None);

        let response = t
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/jobs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::from(json!({ "video_id": video_id }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(t.store.job_count(), 0);
    }

    #[tokio::test]
    async fn listing_requires_a_token() {
        let t = test_app(StubAnalyzer::returning(analysis(1, 0, 0)));

        let response = t
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/jobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn owner_deletes_a_finished_job() {
        let t = test_app(StubAnalyzer::failing("upstream unavailable"));
        let user_id = t.store.seed_user(1, false, None);
        let video_id = t.store.seed_video(Some(user_id));

        let response = t
            .app
            .clone()
            .oneshot(start_request(video_id, Some(user_id)))
            .await
            .unwrap();
        let job_id: Uuid = json_body(response).await["job_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        t.tasks.wait(job_id).await;

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/jobs/{job_id}"))
                    .header(header::AUTHORIZATION, bearer(user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!t.store.has_job(job_id));
    }
}
