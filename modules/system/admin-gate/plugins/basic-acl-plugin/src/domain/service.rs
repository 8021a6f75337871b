//! ACL evaluation.

use std::sync::Arc;

use admin_gate_sdk::DirectoryClient;
use gate_security::token::claims;
use gate_security::{AuthToken, AuthorizationGrant, DenyReason};

use crate::config::{AclRule, BasicAclPluginConfig};

/// In-process ACL evaluator backed by a static rule set.
///
/// Group membership is resolved through the directory on every evaluation;
/// decisions are never cached, so a revoked membership takes effect on the
/// next request.
pub struct Service {
    rules: Vec<AclRule>,
    directory: Arc<dyn DirectoryClient>,
}

impl Service {
    #[must_use]
    pub fn new(cfg: BasicAclPluginConfig, directory: Arc<dyn DirectoryClient>) -> Self {
        Self {
            rules: cfg.rules,
            directory,
        }
    }

    /// The rule covering `(resource, operation)`, if any.
    ///
    /// Rules match on dot-separated resource prefixes; the longest matching
    /// prefix wins.
    fn matching_rule(&self, resource: &str, operation: &str) -> Option<&AclRule> {
        self.rules
            .iter()
            .filter(|r| r.operation == operation && covers(&r.resource, resource))
            .max_by_key(|r| r.resource.len())
    }

    pub(crate) async fn evaluate(
        &self,
        token: &AuthToken,
        resource: &str,
        operation: &str,
    ) -> Result<AuthorizationGrant, DenyReason> {
        let uid = token.claim(claims::UID).ok_or_else(|| {
            DenyReason::EvaluationFailed("token carries no user id".to_owned())
        })?;

        let Some(rule) = self.matching_rule(resource, operation) else {
            return Err(DenyReason::PolicyDeny {
                resource: resource.to_owned(),
                operation: operation.to_owned(),
            });
        };

        let memberships = self
            .directory
            .find_groups(uid)
            .await
            .map_err(|err| DenyReason::EvaluationFailed(err.to_string()))?;

        if rule.groups.iter().any(|g| memberships.contains(g)) {
            tracing::debug!(uid = %uid, resource = %resource, operation = %operation, "access granted");
            Ok(AuthorizationGrant::new(Some(&rule.resource), Some(operation)))
        } else {
            Err(DenyReason::PolicyDeny {
                resource: resource.to_owned(),
                operation: operation.to_owned(),
            })
        }
    }
}

/// `rule` covers `resource` when equal or when `rule` is a dot-separated
/// prefix. `certServer.log` covers `certServer.log.instances` but not
/// `certServer.logging`.
fn covers(rule: &str, resource: &str) -> bool {
    resource == rule
        || (resource.len() > rule.len()
            && resource.starts_with(rule)
            && resource.as_bytes()[rule.len()] == b'.')
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::covers;

    #[test]
    fn covers_matches_exact_and_dotted_children() {
        assert!(covers("certServer.log", "certServer.log"));
        assert!(covers("certServer.log", "certServer.log.instances"));
        assert!(!covers("certServer.log", "certServer.logging"));
        assert!(!covers("certServer.log.instances", "certServer.log"));
    }
}
