use thiserror::Error;

use super::password::PasswordError;
use super::repository::StoreError;
use super::token::TokenError;

/// Business errors for auth workflows.
///
/// Display strings are safe to show to callers, except `Internal`, whose
/// payload is for logs only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("password does not meet strength requirements")]
    WeakPassword,
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::InvalidInput(_) => 1001,
            AuthError::WeakPassword => 1002,
            AuthError::UsernameTaken => 1003,
            AuthError::EmailTaken => 1004,
            AuthError::InvalidCredentials => 1005,
            AuthError::ExpiredToken => 1101,
            AuthError::InvalidToken => 1102,
            AuthError::Internal(_) => 1200,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AuthError::InvalidInput(msg.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername => AuthError::UsernameTaken,
            StoreError::DuplicateEmail => AuthError::EmailTaken,
            StoreError::Invalid(msg) => AuthError::InvalidInput(msg),
            StoreError::Backend(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Invalid(_) => AuthError::InvalidToken,
            TokenError::MissingSecret | TokenError::Signing(_) => AuthError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Mismatch => AuthError::InvalidCredentials,
            PasswordError::Hashing(_) | PasswordError::MalformedHash(_) => AuthError::Internal(e.to_string()),
        }
    }
}
