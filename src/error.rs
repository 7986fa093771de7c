use thiserror::Error;

use crate::validation::ValidationError;

// SQLSTATE codes the transfer path reacts to.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient funds on account {account_id}")]
    InsufficientFunds { account_id: i64 },

    #[error("transfer aborted after {attempts} conflicting attempts")]
    Conflict { attempts: u32 },

    #[error("cancelled before commit")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// True when the store reported a conflict a fresh attempt may resolve
    /// (serialization failure or detected deadlock).
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Database(err) => matches!(
                sqlstate(err).as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ),
            _ => false,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::InvalidArgument(err.to_string())
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

pub(crate) fn is_check_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(CHECK_VIOLATION)
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;

    #[test]
    fn validation_error_maps_to_invalid_argument() {
        let err: LedgerError = validation::validate_positive_amount(0).unwrap_err().into();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
        assert!(err.to_string().starts_with("invalid argument"));
    }

    #[test]
    fn row_not_found_is_not_transient() {
        let err = LedgerError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_transient());
    }

    #[test]
    fn non_database_errors_are_not_transient() {
        assert!(!LedgerError::Cancelled.is_transient());
        assert!(!LedgerError::Conflict { attempts: 4 }.is_transient());
        assert!(!LedgerError::NotFound("account 7".to_string()).is_transient());
    }

    #[test]
    fn conflict_reports_attempt_count() {
        let err = LedgerError::Conflict { attempts: 4 };
        assert_eq!(
            err.to_string(),
            "transfer aborted after 4 conflicting attempts"
        );
    }
}
