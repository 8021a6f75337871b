//! `AuthzPluginClient` implementation.

use admin_gate_sdk::AuthzPluginClient;
use async_trait::async_trait;
use gate_security::{AuthToken, AuthorizationGrant, DenyReason};

use super::service::Service;

#[async_trait]
impl AuthzPluginClient for Service {
    async fn evaluate(
        &self,
        token: &AuthToken,
        resource: &str,
        operation: &str,
    ) -> Result<AuthorizationGrant, DenyReason> {
        Service::evaluate(self, token, resource, operation).await
    }
}
