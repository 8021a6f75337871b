//! Service implementation for the static authentication plugin.

use std::collections::HashMap;

use admin_gate_sdk::AuthnError;
use gate_security::token::claims;
use gate_security::{AuthToken, Credential};
use secrecy::{ExposeSecret, SecretString};

use crate::config::StaticAuthnPluginConfig;

/// Static credential verifier.
///
/// Unknown uid and wrong password are indistinguishable to the caller; both
/// verify as `Unauthorized`.
pub struct Service {
    passwords: HashMap<String, SecretString>,
    cert_map: HashMap<String, String>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticAuthnPluginConfig) -> Self {
        let passwords = cfg
            .users
            .iter()
            .map(|u| (u.uid.clone(), u.password.clone()))
            .collect();
        let cert_map = cfg
            .cert_mappings
            .iter()
            .map(|m| (m.subject_dn.trim().to_owned(), m.uid.clone()))
            .collect();
        Self {
            passwords,
            cert_map,
        }
    }

    /// Verify a credential against the configured entries.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for unknown subjects and failed password checks.
    pub fn verify(&self, credential: &Credential) -> Result<AuthToken, AuthnError> {
        match credential {
            Credential::Basic { uid, password } => {
                let expected = self
                    .passwords
                    .get(uid.as_str())
                    .ok_or_else(|| AuthnError::Unauthorized("invalid credentials".to_owned()))?;
                if expected.expose_secret() != password.expose_secret() {
                    return Err(AuthnError::Unauthorized("invalid credentials".to_owned()));
                }
                tracing::debug!(uid = %uid, "verified basic credential");
                Ok(AuthToken::new()
                    .with_claim(claims::UID, uid.as_str())
                    .with_claim(claims::AUTH_MGR, credential.scheme().as_str()))
            }
            Credential::Certificate { chain } => {
                let subject_dn = chain
                    .first()
                    .map(|c| c.subject_dn.trim())
                    .ok_or(AuthnError::NoCredential)?;
                let uid = self
                    .cert_map
                    .get(subject_dn)
                    .ok_or_else(|| AuthnError::Unauthorized("unmapped certificate".to_owned()))?;
                tracing::debug!(subject_dn = %subject_dn, uid = %uid, "mapped client certificate");
                Ok(AuthToken::new()
                    .with_claim(claims::UID, uid)
                    .with_claim(claims::AUTH_MGR, credential.scheme().as_str())
                    .with_claim(claims::CERT_SUBJECT, subject_dn))
            }
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("users", &self.passwords.len())
            .field("cert_mappings", &self.cert_map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use admin_gate_sdk::AuthnError;
    use gate_security::token::claims;
    use gate_security::{Credential, PeerCertificate};
    use secrecy::SecretString;

    use super::Service;
    use crate::config::{CertMapping, StaticAuthnPluginConfig, UserEntry};

    fn service() -> Service {
        Service::from_config(&StaticAuthnPluginConfig {
            users: vec![UserEntry {
                uid: "admin".to_owned(),
                password: SecretString::from("letmein".to_owned()),
            }],
            cert_mappings: vec![CertMapping {
                subject_dn: "CN=Admin,O=Example".to_owned(),
                uid: "admin".to_owned(),
            }],
        })
    }

    fn basic(uid: &str, password: &str) -> Credential {
        Credential::Basic {
            uid: uid.to_owned(),
            password: SecretString::from(password.to_owned()),
        }
    }

    #[test]
    fn correct_password_yields_token_with_uid_claim() {
        let token = service().verify(&basic("admin", "letmein")).unwrap();
        assert_eq!(token.user_id(), Some("admin"));
        assert_eq!(token.claim(claims::AUTH_MGR), Some("passwdUserDBAuthMgr"));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let err = service().verify(&basic("admin", "wrongpass")).unwrap_err();
        assert!(matches!(err, AuthnError::Unauthorized(_)));
    }

    #[test]
    fn unknown_uid_is_unauthorized() {
        let err = service().verify(&basic("nobody", "letmein")).unwrap_err();
        assert!(matches!(err, AuthnError::Unauthorized(_)));
    }

    #[test]
    fn mapped_certificate_subject_resolves_to_uid() {
        let cred = Credential::from_peer_chain(vec![PeerCertificate {
            der: vec![0x30],
            subject_dn: " CN=Admin,O=Example ".to_owned(),
        }])
        .unwrap();

        let token = service().verify(&cred).unwrap();
        assert_eq!(token.user_id(), Some("admin"));
        assert_eq!(token.claim(claims::CERT_SUBJECT), Some("CN=Admin,O=Example"));
    }

    #[test]
    fn unmapped_certificate_subject_is_unauthorized() {
        let cred = Credential::from_peer_chain(vec![PeerCertificate {
            der: vec![0x30],
            subject_dn: "CN=Stranger".to_owned(),
        }])
        .unwrap();

        let err = service().verify(&cred).unwrap_err();
        assert!(matches!(err, AuthnError::Unauthorized(_)));
    }
}
