use async_trait::async_trait;
use diesel::{
    OptionalExtension, PgConnection, RunQueryDsl,
    connection::{AnsiTransactionManager, TransactionManager},
    insert_into,
    pg::Pg,
    prelude::*,
    query_builder::{BoxedSqlQuery, SqlQuery},
    result::Error as DieselError,
    sql_query,
    sql_types::{
        Array, BigInt, Bool, Double, Integer, Nullable, Text, Timestamptz, Uuid as SqlUuid,
    },
};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{captions, highlights, jobs, thumbnails, users},
    },
};
use domain::{
    entities::{jobs::ProcessingJobEntity, users::UserEntity},
    repositories::transaction::TransactionRepository,
    value_objects::transaction::{
        FetchedRow, OperationOutcome, SqlParam, TransactionBatch, TransactionError, TxOperation,
    },
};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn execute(
        &self,
        batch: TransactionBatch,
    ) -> Result<Vec<OperationOutcome>, TransactionError> {
        if batch.is_empty() {
            return Err(TransactionError::EmptyBatch);
        }

        let mut conn = Arc::clone(&self.db_pool)
            .get()
            .map_err(|err| TransactionError::Connection(err.into()))?;

        run_batch(&mut conn, batch.into_operations())
    }

    async fn execute_single(
        &self,
        operation: TxOperation,
    ) -> Result<OperationOutcome, TransactionError> {
        let mut outcomes = self.execute(TransactionBatch::single(operation)).await?;
        outcomes.pop().ok_or(TransactionError::EmptyBatch)
    }
}

pub(crate) fn run_batch(
    conn: &mut PgConnection,
    operations: Vec<TxOperation>,
) -> Result<Vec<OperationOutcome>, TransactionError> {
    let operation_count = operations.len();
    debug!(operation_count, "transaction: executing batch");

    AnsiTransactionManager::begin_transaction(conn)
        .map_err(|err| TransactionError::Begin(err.into()))?;

    let mut outcomes = Vec::with_capacity(operation_count);
    for (index, operation) in operations.into_iter().enumerate() {
        match run_operation(conn, operation) {
            Ok(outcome) => outcomes.push(outcome),
            Err(source) => {
                warn!(index, operation_count, error = ?source, "transaction: operation failed, rolling back");
                if let Err(rollback_error) = AnsiTransactionManager::rollback_transaction(conn) {
                    error!(
                        index,
                        error = ?rollback_error,
                        "transaction: rollback after failed operation failed"
                    );
                    return Err(TransactionError::RollbackFailed {
                        index,
                        source: source.into(),
                        rollback_error: rollback_error.into(),
                    });
                }
                return Err(TransactionError::OperationFailed {
                    index,
                    source: source.into(),
                });
            }
        }
    }

    // A failed COMMIT is followed by a ROLLBACK inside the transaction manager; when that
    // rollback fails too it reports RollbackErrorOnCommit.
    match AnsiTransactionManager::commit_transaction(conn) {
        Ok(()) => {
            debug!(operation_count, "transaction: committed");
            Ok(outcomes)
        }
        Err(DieselError::RollbackErrorOnCommit {
            rollback_error,
            commit_error,
        }) => {
            error!(
                commit_error = ?commit_error,
                rollback_error = ?rollback_error,
                "transaction: commit and rollback both failed, state unknown"
            );
            Err(TransactionError::CommitStateUnknown {
                commit_error: (*commit_error).into(),
                rollback_error: (*rollback_error).into(),
            })
        }
        Err(commit_error) => {
            error!(error = ?commit_error, "transaction: commit failed and was rolled back");
            Err(TransactionError::CommitFailed(commit_error.into()))
        }
    }
}

fn run_operation(conn: &mut PgConnection, operation: TxOperation) -> QueryResult<OperationOutcome> {
    match operation {
        TxOperation::InsertHighlight(entity) => insert_into(highlights::table)
            .values(&entity)
            .returning(highlights::id)
            .get_result::<Uuid>(conn)
            .map(|id| OperationOutcome::Inserted { id }),
        TxOperation::InsertThumbnail(entity) => insert_into(thumbnails::table)
            .values(&entity)
            .returning(thumbnails::id)
            .get_result::<Uuid>(conn)
            .map(|id| OperationOutcome::Inserted { id }),
        TxOperation::InsertCaption(entity) => insert_into(captions::table)
            .values(&entity)
            .returning(captions::id)
            .get_result::<Uuid>(conn)
            .map(|id| OperationOutcome::Inserted { id }),
        TxOperation::Execute { sql, params } => {
            let query = params
                .into_iter()
                .fold(sql_query(sql).into_boxed::<Pg>(), bind_param);
            query
                .execute(conn)
                .map(|count| OperationOutcome::RowsAffected { count })
        }
        TxOperation::FetchJob { job_id } => jobs::table
            .find(job_id)
            .select(ProcessingJobEntity::as_select())
            .first::<ProcessingJobEntity>(conn)
            .optional()
            .map(|row| OperationOutcome::Row(row.map(FetchedRow::Job))),
        TxOperation::FetchUser { user_id } => users::table
            .find(user_id)
            .select(UserEntity::as_select())
            .first::<UserEntity>(conn)
            .optional()
            .map(|row| OperationOutcome::Row(row.map(FetchedRow::User))),
    }
}

fn bind_param(
    query: BoxedSqlQuery<'static, Pg, SqlQuery>,
    param: SqlParam,
) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    match param {
        SqlParam::Text(value) => query.bind::<Text, _>(value),
        SqlParam::Integer(value) => query.bind::<Integer, _>(value),
        SqlParam::BigInt(value) => query.bind::<BigInt, _>(value),
        SqlParam::Double(value) => query.bind::<Double, _>(value),
        SqlParam::Bool(value) => query.bind::<Bool, _>(value),
        SqlParam::Uuid(value) => query.bind::<SqlUuid, _>(value),
        SqlParam::Timestamp(value) => query.bind::<Timestamptz, _>(value),
        SqlParam::TextArray(value) => query.bind::<Array<Text>, _>(value),
        SqlParam::NullText => query.bind::<Nullable<Text>, _>(None::<String>),
    }
}
