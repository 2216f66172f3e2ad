//! sea-orm error helpers.

use sea_orm::{DbErr, SqlErr, TransactionError};

/// Detects unique-index violations so callers can map insert races to the
/// same "taken" error a pre-check would have produced.
pub trait UniqueViolation {
    /// The driver message of a unique violation (it names the constraint),
    /// or `None` for any other error.
    fn unique_violation(&self) -> Option<String>;

    fn is_unique_violation(&self) -> bool {
        self.unique_violation().is_some()
    }
}

impl UniqueViolation for DbErr {
    fn unique_violation(&self) -> Option<String> {
        match self.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
            _ => None,
        }
    }
}

impl UniqueViolation for TransactionError<DbErr> {
    fn unique_violation(&self) -> Option<String> {
        match self {
            TransactionError::Connection(e) | TransactionError::Transaction(e) => {
                e.unique_violation()
            }
        }
    }
}
