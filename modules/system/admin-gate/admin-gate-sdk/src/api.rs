//! Consumed-interface traits of the admin gate.
//!
//! The gate talks to its collaborators exclusively through these traits,
//! injected as `Arc<dyn ...>`. Plugins implement them; tests substitute
//! in-memory doubles.

use async_trait::async_trait;
use gate_security::{AuthToken, AuthorizationGrant, Credential, DenyReason};

use crate::error::{AuthnError, DirectoryError};
use crate::models::{Group, User};

/// Credential verification backend.
///
/// One implementation per configured authentication scheme; the credential
/// carries which scheme produced it.
#[async_trait]
pub trait AuthnPluginClient: Send + Sync {
    /// Verify a credential and return the resulting token.
    ///
    /// The token is expected to carry a user-id claim; the gate treats a
    /// token without one as an authentication failure.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the credential fails verification
    /// - `Internal` for unexpected backend errors
    async fn verify(&self, credential: &Credential) -> Result<AuthToken, AuthnError>;
}

/// Authorization policy backend.
///
/// Selected once at startup; never switched mid-session.
#[async_trait]
pub trait AuthzPluginClient: Send + Sync {
    /// Evaluate `(resource, operation)` for the authenticated token.
    ///
    /// Deny is data: an explicit `DenyReason`, never an absent value.
    /// Evaluation failures map to `DenyReason::EvaluationFailed` and callers
    /// must treat them as deny.
    ///
    /// # Errors
    ///
    /// `DenyReason` for both policy denials and evaluation failures.
    async fn evaluate(
        &self,
        token: &AuthToken,
        resource: &str,
        operation: &str,
    ) -> Result<AuthorizationGrant, DenyReason>;
}

/// User/group directory (LDAP-backed in the source system).
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// # Errors
    ///
    /// `UserNotFound` when no such uid exists.
    async fn get_user(&self, uid: &str) -> Result<User, DirectoryError>;

    /// # Errors
    ///
    /// `Internal` on backend failure.
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError>;

    /// # Errors
    ///
    /// `Conflict` when the uid is already taken.
    async fn add_user(&self, user: User) -> Result<(), DirectoryError>;

    /// Replace the record with the same uid.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when no such uid exists.
    async fn modify_user(&self, user: User) -> Result<(), DirectoryError>;

    /// Remove the user and its group memberships.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when no such uid exists.
    async fn remove_user(&self, uid: &str) -> Result<(), DirectoryError>;

    /// # Errors
    ///
    /// `GroupNotFound` when no such group exists.
    async fn get_group(&self, name: &str) -> Result<Group, DirectoryError>;

    /// Groups whose name contains the filter (all groups when `None`).
    ///
    /// # Errors
    ///
    /// `Internal` on backend failure.
    async fn list_groups(&self, filter: Option<&str>) -> Result<Vec<Group>, DirectoryError>;

    /// Names of the groups the uid belongs to.
    ///
    /// # Errors
    ///
    /// `Internal` on backend failure.
    async fn find_groups(&self, member_uid: &str) -> Result<Vec<String>, DirectoryError>;

    /// # Errors
    ///
    /// `Conflict` when the name is already taken.
    async fn add_group(&self, group: Group) -> Result<(), DirectoryError>;

    /// Replace the record with the same name.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` when no such group exists.
    async fn modify_group(&self, group: Group) -> Result<(), DirectoryError>;

    /// # Errors
    ///
    /// `GroupNotFound` when no such group exists.
    async fn remove_group(&self, name: &str) -> Result<(), DirectoryError>;

    /// # Errors
    ///
    /// `GroupNotFound`/`UserNotFound` for missing parties, `Conflict` when
    /// the uid is already a member.
    async fn add_member(&self, group: &str, uid: &str) -> Result<(), DirectoryError>;

    /// # Errors
    ///
    /// `GroupNotFound` for a missing group, `UserNotFound` when the uid is
    /// not a member.
    async fn remove_member(&self, group: &str, uid: &str) -> Result<(), DirectoryError>;
}
