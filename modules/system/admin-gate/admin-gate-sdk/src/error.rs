//! Error types for the admin gate SDK.

use gate_security::CredentialError;
use thiserror::Error;

/// Errors from authentication plugins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthnError {
    /// Certificate scheme: the transport presented no peer chain.
    #[error("no credential presented")]
    NoCredential,

    /// Basic scheme: the authorization header could not be parsed.
    #[error("malformed credential")]
    MalformedCredential,

    /// The credential was parsed but verification rejected it.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An internal error occurred during verification.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CredentialError> for AuthnError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NoCredential => AuthnError::NoCredential,
            CredentialError::MalformedCredential => AuthnError::MalformedCredential,
        }
    }
}

/// Errors from the user/group directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user not found: {uid}")]
    UserNotFound { uid: String },

    #[error("group not found: {name}")]
    GroupNotFound { name: String },

    /// The entry already exists, or a uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    #[must_use]
    pub fn user_not_found(uid: impl Into<String>) -> Self {
        Self::UserNotFound { uid: uid.into() }
    }

    #[must_use]
    pub fn group_not_found(name: impl Into<String>) -> Self {
        Self::GroupNotFound { name: name.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
