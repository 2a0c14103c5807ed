use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::users::UserRepository,
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
};
use tracing::info;

use crate::{
    auth::AuthUser, axum_http::error_responses::AppError, usecases::credit_ledger::CreditLedger,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let credit_ledger = CreditLedger::new(Arc::new(user_repository));

    router(Arc::new(credit_ledger))
}

pub fn router<U>(credit_ledger: Arc<CreditLedger<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(balance::<U>))
        .with_state(credit_ledger)
}

pub async fn balance<U>(
    State(credit_ledger): State<Arc<CreditLedger<U>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    info!(%user_id, "credits: balance requested");
    let balance = credit_ledger.balance(user_id).await?;

    Ok(Json(balance))
}
