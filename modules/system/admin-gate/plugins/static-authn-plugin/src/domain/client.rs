//! `AuthnPluginClient` implementation.

use admin_gate_sdk::{AuthnError, AuthnPluginClient};
use async_trait::async_trait;
use gate_security::{AuthToken, Credential};

use super::service::Service;

#[async_trait]
impl AuthnPluginClient for Service {
    async fn verify(&self, credential: &Credential) -> Result<AuthToken, AuthnError> {
        Service::verify(self, credential)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use admin_gate_sdk::AuthnPluginClient;
    use gate_security::Credential;
    use secrecy::SecretString;

    use crate::config::{StaticAuthnPluginConfig, UserEntry};
    use crate::domain::service::Service;

    #[tokio::test]
    async fn verifies_through_the_client_trait() {
        let service: Arc<dyn AuthnPluginClient> =
            Arc::new(Service::from_config(&StaticAuthnPluginConfig {
                users: vec![UserEntry {
                    uid: "admin".to_owned(),
                    password: SecretString::from("letmein".to_owned()),
                }],
                cert_mappings: Vec::new(),
            }));

        let token = service
            .verify(&Credential::Basic {
                uid: "admin".to_owned(),
                password: SecretString::from("letmein".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(token.user_id(), Some("admin"));
    }
}
