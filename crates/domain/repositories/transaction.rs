use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::transaction::{
    OperationOutcome, TransactionBatch, TransactionError, TxOperation,
};

#[async_trait]
#[automock]
pub trait TransactionRepository {
    /// Runs every operation in order inside one transaction. Either all outcomes come
    /// back, index-aligned with the batch, or nothing was committed.
    async fn execute(
        &self,
        batch: TransactionBatch,
    ) -> Result<Vec<OperationOutcome>, TransactionError>;

    async fn execute_single(
        &self,
        operation: TxOperation,
    ) -> Result<OperationOutcome, TransactionError>;
}
