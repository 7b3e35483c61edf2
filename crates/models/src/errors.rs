use thiserror::Error;

/// Column guarded by a unique index that an insert collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),
    #[error("database error: {0}")]
    Db(String),
}
