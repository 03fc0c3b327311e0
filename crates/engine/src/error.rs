//! The module contains the error the engine can throw.
//!
//! Domain errors (client faults):
//!
//! - [`InvalidOperation`] malformed or policy-violating input.
//! - [`InsufficientFunds`] a mutation would drive a balance negative.
//! - [`AccountNotFound`] a read or debit against an unknown account.
//!
//! Infrastructure errors (server faults):
//!
//! - [`RateUnavailable`] the currency rate cannot be resolved.
//! - [`Conflict`] the store aborted a serializable unit of work; retryable.
//! - [`CacheUnavailable`] and [`Store`] collaborator failures.
//!
//!  [`InvalidOperation`]: EngineError::InvalidOperation
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`RateUnavailable`]: EngineError::RateUnavailable
//!  [`Conflict`]: EngineError::Conflict
//!  [`CacheUnavailable`]: EngineError::CacheUnavailable
//!  [`Store`]: EngineError::Store
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

use crate::cache::CacheError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("account {0} not found")]
    AccountNotFound(i64),
    #[error("Rate unavailable: {0}")]
    RateUnavailable(String),
    #[error("Serialization conflict: {0}")]
    Conflict(String),
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Store unavailable: {0}")]
    Store(DbErr),
}

impl EngineError {
    /// `true` for errors caused by the request rather than by the service.
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation(_) | Self::InsufficientFunds(_) | Self::AccountNotFound(_)
        )
    }

    /// `true` if repeating the same unit of work may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_serialization_failure(&err) {
            return Self::Conflict(err.to_string());
        }
        Self::Store(err)
    }
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        Self::CacheUnavailable(err.to_string())
    }
}

/// Postgres reports `40001`/`40P01`, SQLite `SQLITE_BUSY` (5) and its
/// extended codes `SQLITE_BUSY_RECOVERY` (261), `SQLITE_BUSY_SNAPSHOT` (517)
/// and `SQLITE_BUSY_TIMEOUT` (773).
fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return false;
    };
    sqlx_err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| {
            matches!(
                &*code,
                "40001" | "40P01" | "5" | "261" | "517" | "773"
            )
        })
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::RateUnavailable(a), Self::RateUnavailable(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::CacheUnavailable(a), Self::CacheUnavailable(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_db_error_is_not_a_conflict() {
        let err = EngineError::from(DbErr::Custom("disk full".to_string()));
        assert!(matches!(err, EngineError::Store(_)));
        assert!(!err.is_retryable());
        assert!(!err.is_client_fault());
    }

    #[test]
    fn domain_errors_are_client_faults() {
        assert!(EngineError::AccountNotFound(1).is_client_fault());
        assert!(EngineError::InsufficientFunds("x".to_string()).is_client_fault());
        assert!(!EngineError::RateUnavailable("x".to_string()).is_client_fault());
        assert!(EngineError::Conflict("x".to_string()).is_retryable());
    }
}
