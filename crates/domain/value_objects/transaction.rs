//! Operations, outcomes and failures of an atomic persistence batch.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    captions::InsertCaptionEntity, highlights::InsertHighlightEntity, jobs::ProcessingJobEntity,
    thumbnails::InsertThumbnailEntity, users::UserEntity,
};

/// Positional parameter for [`TxOperation::Execute`], bound to `$1`, `$2`, ... in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i32),
    BigInt(i64),
    Double(f64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
    NullText,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxOperation {
    InsertHighlight(InsertHighlightEntity),
    InsertThumbnail(InsertThumbnailEntity),
    InsertCaption(InsertCaptionEntity),
    Execute { sql: String, params: Vec<SqlParam> },
    FetchJob { job_id: Uuid },
    FetchUser { user_id: Uuid },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRow {
    Job(ProcessingJobEntity),
    User(UserEntity),
}

/// Result of one operation, at the same index as the operation in its batch.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Inserted { id: Uuid },
    RowsAffected { count: usize },
    Row(Option<FetchedRow>),
}

impl OperationOutcome {
    pub fn inserted_id(&self) -> Option<Uuid> {
        match self {
            OperationOutcome::Inserted { id } => Some(*id),
            _ => None,
        }
    }
}

/// Ordered operations executed as one unit. Executing a batch consumes it, so a batch
/// can neither run twice nor grow after it ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBatch {
    operations: Vec<TxOperation>,
}

impl TransactionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(operation: TxOperation) -> Self {
        Self {
            operations: vec![operation],
        }
    }

    pub fn push(&mut self, operation: TxOperation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<TxOperation> {
        self.operations
    }
}

impl FromIterator<TxOperation> for TransactionBatch {
    fn from_iter<I: IntoIterator<Item = TxOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction batch is empty")]
    EmptyBatch,
    #[error("failed to acquire a database connection: {0}")]
    Connection(#[source] anyhow::Error),
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] anyhow::Error),
    #[error("operation {index} failed, transaction rolled back: {source}")]
    OperationFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("operation {index} failed and the rollback failed too ({rollback_error}): {source}")]
    RollbackFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
        rollback_error: anyhow::Error,
    },
    #[error("commit failed and was rolled back: {0}")]
    CommitFailed(#[source] anyhow::Error),
    #[error(
        "commit failed and the rollback failed ({rollback_error}); state unknown, manual reconciliation required: {commit_error}"
    )]
    CommitStateUnknown {
        #[source]
        commit_error: anyhow::Error,
        rollback_error: anyhow::Error,
    },
}

impl TransactionError {
    /// True when the store is known to hold none of the batch's effects.
    pub fn nothing_written(&self) -> bool {
        !matches!(
            self,
            TransactionError::RollbackFailed { .. } | TransactionError::CommitStateUnknown { .. }
        )
    }
}
