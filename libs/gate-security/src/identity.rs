//! The resolved identity record bound into a session.

use crate::credential::PeerCertificate;

/// Identity record owned by the external user/group store. The gate reads it
/// during authentication and binds it into the session; only the user/group
/// administration facility mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// Free-form account state (e.g. "1" for enabled in the source system).
    pub state: String,
    /// Certificates bound to the account, leaf first per chain.
    pub certificates: Vec<PeerCertificate>,
}

impl User {
    #[must_use]
    pub fn named(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }
}
