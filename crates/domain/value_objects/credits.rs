use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::users::UserEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditDenial {
    AuthenticationRequired,
    UserNotFound,
    InsufficientCredits,
}

impl Display for CreditDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            CreditDenial::AuthenticationRequired => "authentication required",
            CreditDenial::UserNotFound => "user not found",
            CreditDenial::InsufficientCredits => "insufficient credits",
        };
        write!(f, "{}", reason)
    }
}

/// Outcome of a credit gate. `user` reflects any downgrade applied during the check.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditCheck {
    pub can_proceed: bool,
    pub user: Option<UserEntity>,
    pub reason: Option<CreditDenial>,
}

impl CreditCheck {
    pub fn allowed(user: UserEntity) -> Self {
        Self {
            can_proceed: true,
            user: Some(user),
            reason: None,
        }
    }

    pub fn denied(reason: CreditDenial, user: Option<UserEntity>) -> Self {
        Self {
            can_proceed: false,
            user,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditBalanceDto {
    pub credits: i32,
    pub is_subscribed: bool,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl From<UserEntity> for CreditBalanceDto {
    fn from(value: UserEntity) -> Self {
        Self {
            credits: value.credits,
            is_subscribed: value.is_subscribed,
            subscription_expires_at: value.subscription_expires_at,
        }
    }
}
