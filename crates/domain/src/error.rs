//! Errors raised by the integrity layer

use thiserror::Error;

use crate::model::EntityKind;
use crate::ports::StoreError;

/// Failure of a service operation
///
/// Every variant except `Store` is a deterministic outcome of the submitted
/// data and the store contents at check time.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record itself or a referenced parent does not exist
    #[error("{0} not found")]
    NotFound(EntityKind),
    /// The tax identifier is already registered to another producer
    #[error("document already registered to another producer")]
    Conflict,
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("store failure: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Map a failed update or delete on a `kind` record. A store that lost
    /// the row between the existence check and the write reports `NotFound`;
    /// a lost parent keeps the parent's kind.
    pub fn from_write(kind: EntityKind, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ServiceError::NotFound(kind),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // The only store-level constraint is document uniqueness
            StoreError::Conflict(_) => ServiceError::Conflict,
            StoreError::MissingParent(parent) => ServiceError::NotFound(parent),
            other => ServiceError::Store(other.to_string()),
        }
    }
}
