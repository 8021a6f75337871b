pub mod access;
pub mod context;
pub mod credential;
pub mod identity;
pub mod token;
pub mod wire;

pub use access::{AuthorizationGrant, AuthzScheme, DenyReason, GRANT_VALUE_ABSENT};
pub use context::{SessionContext, SessionContextBuilder, resolve_locale};
pub use credential::{
    AuthScheme, Credential, CredentialError, PeerCertificate, UNIDENTIFIED_SUBJECT,
};
pub use identity::User;
pub use token::AuthToken;

pub use wire::{
    OperationResult, OperationStatus, WireDecodeError, WireEncodeError, decode_response,
};
