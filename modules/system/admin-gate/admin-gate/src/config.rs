//! Gate configuration.

use gate_security::{AuthScheme, AuthzScheme};
use serde::{Deserialize, Serialize};

/// Startup configuration of the gate.
///
/// Both schemes are fixed for the life of the process; there is no
/// mid-session switching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GateConfig {
    pub auth_scheme: AuthScheme,
    pub authz_scheme: AuthzScheme,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            auth_scheme: AuthScheme::BasicAuth,
            authz_scheme: AuthzScheme::BasicAcl,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use gate_security::{AuthScheme, AuthzScheme};

    use super::GateConfig;

    #[test]
    fn defaults_to_basic_schemes() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.auth_scheme, AuthScheme::BasicAuth);
        assert_eq!(cfg.authz_scheme, AuthzScheme::BasicAcl);
    }

    #[test]
    fn deserializes_scheme_names() {
        let cfg: GateConfig =
            serde_json::from_str(r#"{"auth_scheme":"cert_user_db","authz_scheme":"dir_acl"}"#)
                .unwrap();
        assert_eq!(cfg.auth_scheme, AuthScheme::CertUserDb);
        assert_eq!(cfg.authz_scheme, AuthzScheme::DirAcl);
    }
}
