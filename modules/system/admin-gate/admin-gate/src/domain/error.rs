//! Gate error taxonomy.

use thiserror::Error;

/// Errors raised by the gate pipeline and the audited-mutation protocol.
///
/// Authentication and authorization failures never reach the client as raw
/// errors: the gate audits them and converts them into structured `Error`
/// responses (authentication additionally rejects at the HTTP level).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    /// Bad/missing credential, unknown user, or a token without an identity
    /// claim. Audited before being raised.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Policy returned deny, or evaluation itself failed.
    #[error("authorization denied")]
    AuthorizationDenied,

    /// Malformed or duplicate identifier.
    #[error("validation error: {0}")]
    Validation(String),

    /// Directory or config-store operation failed.
    #[error("subsystem error: {0}")]
    Subsystem(String),

    /// Persistence commit failed after a successful in-memory mutation;
    /// the caller has already rolled the mutation back.
    #[error("commit error: {0}")]
    Commit(String),
}
