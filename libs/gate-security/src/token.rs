//! Authentication tokens.

use std::collections::BTreeMap;

/// Well-known claim names.
pub mod claims {
    /// Stable user identifier of the authenticated subject.
    pub const UID: &str = "uid";
    /// Name of the scheme that produced the token.
    pub const AUTH_MGR: &str = "authMgrInstName";
    /// Subject DN of the client certificate (certificate scheme only).
    pub const CERT_SUBJECT: &str = "certSubject";
}

/// The result of successful credential verification.
///
/// Carries a set of named claims. A token is only usable by the gate when its
/// [`claims::UID`] claim is present; the gate treats a token without one as an
/// authentication failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthToken {
    claims: BTreeMap<String, String>,
}

impl AuthToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn set_claim(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.claims.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }

    /// The user-id claim, if the verifier supplied one.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.claim(claims::UID)
    }

    #[must_use]
    pub fn claims(&self) -> impl Iterator<Item = (&str, &str)> {
        self.claims.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthToken, claims};

    #[test]
    fn user_id_reads_the_uid_claim() {
        let token = AuthToken::new()
            .with_claim(claims::UID, "admin")
            .with_claim(claims::AUTH_MGR, "passwdUserDBAuthMgr");
        assert_eq!(token.user_id(), Some("admin"));
        assert_eq!(token.claim(claims::AUTH_MGR), Some("passwdUserDBAuthMgr"));
    }

    #[test]
    fn token_without_uid_claim_has_no_user_id() {
        let token = AuthToken::new().with_claim(claims::CERT_SUBJECT, "CN=x");
        assert_eq!(token.user_id(), None);
    }
}
