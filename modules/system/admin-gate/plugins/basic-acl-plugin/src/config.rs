//! Plugin configuration.

use serde::{Deserialize, Serialize};

/// One access rule: members of any listed group may perform `operation` on
/// `resource` and everything below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRule {
    /// Dot-separated resource name, e.g. `certServer.log`.
    pub resource: String,
    /// Operation name, e.g. `read` or `modify`.
    pub operation: String,
    /// Groups granted by this rule.
    pub groups: Vec<String>,
}

/// Static rule set loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicAclPluginConfig {
    pub rules: Vec<AclRule>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::BasicAclPluginConfig;

    #[test]
    fn deserializes_rule_set() {
        let cfg: BasicAclPluginConfig = serde_json::from_str(
            r#"{
                "rules": [
                    {"resource": "certServer.log", "operation": "read",
                     "groups": ["Administrators", "Auditors"]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.rules.len(), 1);
        assert_eq!(cfg.rules[0].groups, ["Administrators", "Auditors"]);
    }

    #[test]
    fn empty_config_has_no_rules() {
        let cfg: BasicAclPluginConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.rules.is_empty());
    }
}
