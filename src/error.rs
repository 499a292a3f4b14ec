//! Domain error taxonomy.
//!
//! Every component below the API layer reports failures through [`Error`].
//! The variants tell the caller *what kind* of failure happened; choosing a
//! transport status code is left to [`crate::api`].

use thiserror::Error;

use crate::model::BloodType;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the record store, the inventory ledger and the entity services.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, malformed or out-of-enum input.
    #[error("{0}")]
    Validation(String),

    /// A unit quantity that is zero, negative or otherwise unusable.
    #[error("{0}")]
    InvalidQuantity(String),

    /// No record exists for the given identifier or key.
    #[error("{0}")]
    NotFound(String),

    /// An allocation asked for more units than are on hand.
    #[error(
        "Insufficient units in inventory: {blood_type} has {available} unit(s), {requested} requested"
    )]
    InsufficientStock {
        blood_type: BloodType,
        requested: i64,
        available: i64,
    },

    /// Failure inside the database engine.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Anything else that should never happen, e.g. a corrupt stored value.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// Whether the failure was caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::Storage(_) | Error::Internal(_))
    }
}
