use std::{fmt::Display, future::Future, sync::Arc};

use axum::http::StatusCode;
use chrono::Utc;
use crates::domain::{
    repositories::users::UserRepository,
    value_objects::credits::{CreditBalanceDto, CreditCheck, CreditDenial},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("user not found")]
    UserNotFound,
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CreditError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CreditError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            CreditError::UserNotFound => StatusCode::NOT_FOUND,
            CreditError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            CreditError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn denial(&self) -> Option<CreditDenial> {
        match self {
            CreditError::AuthenticationRequired => Some(CreditDenial::AuthenticationRequired),
            CreditError::UserNotFound => Some(CreditDenial::UserNotFound),
            CreditError::InsufficientCredits => Some(CreditDenial::InsufficientCredits),
            _ => None,
        }
    }
}

impl From<CreditDenial> for CreditError {
    fn from(value: CreditDenial) -> Self {
        match value {
            CreditDenial::AuthenticationRequired => CreditError::AuthenticationRequired,
            CreditDenial::UserNotFound => CreditError::UserNotFound,
            CreditDenial::InsufficientCredits => CreditError::InsufficientCredits,
        }
    }
}

pub type CreditResult<T> = std::result::Result<T, CreditError>;

/// How a successful deduction was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditCharge {
    Debited,
    CoveredBySubscription,
}

/// Gate in front of the paid operation. Holds no state of its own: every decision is
/// made against the stored user row.
pub struct CreditLedger<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
}

impl<U> CreditLedger<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn check_credits(&self, user_id: Option<Uuid>) -> CreditResult<CreditCheck> {
        let Some(user_id) = user_id else {
            debug!("credit_ledger: anonymous caller cannot spend credits");
            return Ok(CreditCheck::denied(
                CreditDenial::AuthenticationRequired,
                None,
            ));
        };

        let Some(mut user) = self.user_repo.find_user_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "credit_ledger: failed to load user");
            CreditError::Internal(err)
        })?
        else {
            warn!(%user_id, "credit_ledger: user not found");
            return Ok(CreditCheck::denied(CreditDenial::UserNotFound, None));
        };

        let now = Utc::now();

        if user.subscription_lapsed(now) {
            info!(
                %user_id,
                expired_at = ?user.subscription_expires_at,
                "credit_ledger: subscription expired, downgrading"
            );
            self.user_repo
                .clear_subscription(user_id)
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "credit_ledger: failed to clear subscription");
                    CreditError::Internal(err)
                })?;
            user.is_subscribed = false;
            user.subscription_expires_at = None;
        }

        if user.has_active_subscription(now) {
            debug!(%user_id, "credit_ledger: active subscription");
            return Ok(CreditCheck::allowed(user));
        }

        if user.credits <= 0 {
            info!(%user_id, credits = user.credits, "credit_ledger: insufficient credits");
            return Ok(CreditCheck::denied(
                CreditDenial::InsufficientCredits,
                Some(user),
            ));
        }

        Ok(CreditCheck::allowed(user))
    }

    /// Spends one credit. `prefetched` skips the re-check when the caller just ran one;
    /// the balance guard in the update still decides the race.
    pub async fn deduct_credits(
        &self,
        user_id: Uuid,
        prefetched: Option<CreditCheck>,
    ) -> CreditResult<CreditCharge> {
        let check = match prefetched {
            Some(check) => check,
            None => self.check_credits(Some(user_id)).await?,
        };

        if !check.can_proceed {
            let reason = check.reason.unwrap_or(CreditDenial::InsufficientCredits);
            return Err(reason.into());
        }

        let user = check.user.ok_or(CreditError::UserNotFound)?;

        if user.has_active_subscription(Utc::now()) {
            info!(%user_id, "credit_ledger: subscriber, no credit deducted");
            return Ok(CreditCharge::CoveredBySubscription);
        }

        let updated = self
            .user_repo
            .decrement_credit_if_positive(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "credit_ledger: failed to deduct credit");
                CreditError::Internal(err)
            })?;

        if updated == 0 {
            warn!(%user_id, "credit_ledger: balance exhausted before deduction");
            return Err(CreditError::InsufficientCredits);
        }

        info!(%user_id, "credit_ledger: deducted 1 credit");
        Ok(CreditCharge::Debited)
    }

    /// Gives one credit back. Never fails: errors are logged and the credit is lost.
    pub async fn refund_credits(&self, user_id: Uuid) {
        match self.user_repo.find_user_by_id(user_id).await {
            Ok(Some(user)) if user.has_active_subscription(Utc::now()) => {
                info!(%user_id, "credit_ledger: subscriber, nothing to refund");
            }
            Ok(Some(_)) => self.restore_credit(user_id).await,
            Ok(None) => {
                warn!(%user_id, "credit_ledger: refund skipped, user not found");
            }
            Err(err) => {
                error!(%user_id, db_error = ?err, "credit_ledger: refund failed, credit lost");
            }
        }
    }

    /// Deducts, runs `operation`, and refunds if it fails. The operation's own error is
    /// returned unchanged.
    pub async fn execute_with_rollback<T, E, F, Fut>(
        &self,
        user_id: Uuid,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CreditError> + Display,
    {
        let charge = self.deduct_credits(user_id, None).await?;

        match operation().await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(%user_id, error = %err, "credit_ledger: operation failed, rolling back credit");
                if charge == CreditCharge::Debited {
                    self.restore_credit(user_id).await;
                }
                Err(err)
            }
        }
    }

    /// Current balance, after any lazy subscription downgrade.
    pub async fn balance(&self, user_id: Uuid) -> CreditResult<CreditBalanceDto> {
        let check = self.check_credits(Some(user_id)).await?;
        check
            .user
            .map(CreditBalanceDto::from)
            .ok_or(CreditError::UserNotFound)
    }

    async fn restore_credit(&self, user_id: Uuid) {
        match self.user_repo.increment_credits(user_id, 1).await {
            Ok(0) => warn!(%user_id, "credit_ledger: refund matched no user"),
            Ok(_) => info!(%user_id, "credit_ledger: refunded 1 credit"),
            Err(err) => {
                error!(%user_id, db_error = ?err, "credit_ledger: refund failed, credit lost");
            }
        }
    }
}
