//! Authorization decision types.
//!
//! Deny is data, not an exception: evaluation returns
//! `Result<AuthorizationGrant, DenyReason>` and callers match on it. An
//! absent decision does not exist as a state.

/// Sentinel recorded in audit entries when the backend granted access but
/// omitted the matched resource or operation string.
pub const GRANT_VALUE_ABSENT: &str = "$NonRoleAdjustment$";

/// Authorization scheme, selected by configuration at startup and immutable
/// for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzScheme {
    /// ACL table evaluated in process.
    BasicAcl,
    /// ACLs resolved through the directory.
    DirAcl,
}

impl AuthzScheme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthzScheme::BasicAcl => "BasicAclAuthz",
            AuthzScheme::DirAcl => "DirAclAuthz",
        }
    }
}

impl std::fmt::Display for AuthzScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A granted `(resource, operation)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    resource: String,
    operation: String,
}

impl AuthorizationGrant {
    /// Build a grant, substituting [`GRANT_VALUE_ABSENT`] for fields the
    /// backend left empty.
    #[must_use]
    pub fn new(resource: Option<&str>, operation: Option<&str>) -> Self {
        let fill = |v: Option<&str>| {
            v.filter(|s| !s.is_empty())
                .unwrap_or(GRANT_VALUE_ABSENT)
                .to_owned()
        };
        Self {
            resource: fill(resource),
            operation: fill(operation),
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Why an authorization request was not granted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    /// Policy evaluation ran and returned deny.
    #[error("access denied by policy for {resource}:{operation}")]
    PolicyDeny { resource: String, operation: String },

    /// Evaluation itself failed; treated as deny.
    #[error("authorization evaluation failed: {0}")]
    EvaluationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationGrant, GRANT_VALUE_ABSENT};

    #[test]
    fn grant_substitutes_sentinel_for_absent_fields() {
        let grant = AuthorizationGrant::new(Some("certServer.log.configuration"), None);
        assert_eq!(grant.resource(), "certServer.log.configuration");
        assert_eq!(grant.operation(), GRANT_VALUE_ABSENT);
    }

    #[test]
    fn grant_treats_empty_as_absent() {
        let grant = AuthorizationGrant::new(Some(""), Some("modify"));
        assert_eq!(grant.resource(), GRANT_VALUE_ABSENT);
        assert_eq!(grant.operation(), "modify");
    }
}
