//! Plugin descriptor registry.
//!
//! Injected into the facility; never a process-wide static. Descriptors
//! carry a typed parameter schema instead of `key=default` strings so that
//! defaults and sensitivity are machine-checkable.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// Value kind of one schema parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    /// Never echoed in audit snapshots or logs.
    Password,
}

impl ParamKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Password => "password",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(ParamKind::String),
            "integer" => Some(ParamKind::Integer),
            "boolean" => Some(ParamKind::Boolean),
            "password" => Some(ParamKind::Password),
            _ => None,
        }
    }
}

/// One schema entry of a plugin descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: String,
    pub description: String,
}

impl ConfigParam {
    /// Parse the wire form `kind;default;description`.
    ///
    /// # Errors
    ///
    /// A message naming the malformed field.
    pub fn parse(name: impl Into<String>, spec: &str) -> Result<Self, String> {
        let name = name.into();
        let mut fields = spec.splitn(3, ';');
        let kind = fields
            .next()
            .and_then(ParamKind::parse)
            .ok_or_else(|| format!("unknown parameter kind in {spec:?} for {name}"))?;
        let default = fields.next().unwrap_or("").to_owned();
        let description = fields.next().unwrap_or("").to_owned();
        Ok(Self {
            name,
            kind,
            default,
            description,
        })
    }

    /// Wire form consumed by [`ConfigParam::parse`].
    #[must_use]
    pub fn render(&self) -> String {
        format!("{};{};{}", self.kind.as_str(), self.default, self.description)
    }
}

/// A registered log destination implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPluginDescriptor {
    pub name: String,
    pub class_name: String,
    pub schema: Vec<ConfigParam>,
}

impl LogPluginDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            schema: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: ConfigParam) -> Self {
        self.schema.push(param);
        self
    }
}

/// In-memory registry of plugin descriptors and configured instances.
///
/// Registration is in-memory only; durability is the caller's commit. The
/// remove methods exist so a failed commit can undo a registration.
#[derive(Debug, Default)]
pub struct LogPluginRegistry {
    plugins: RwLock<BTreeMap<String, LogPluginDescriptor>>,
    // instance id -> plugin name
    instances: RwLock<BTreeMap<String, String>>,
}

impl LogPluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; returns false when the name is taken.
    pub fn register_plugin(&self, descriptor: LogPluginDescriptor) -> bool {
        let mut plugins = self.plugins.write();
        if plugins.contains_key(&descriptor.name) {
            return false;
        }
        plugins.insert(descriptor.name.clone(), descriptor);
        true
    }

    pub fn remove_plugin(&self, name: &str) -> Option<LogPluginDescriptor> {
        self.plugins.write().remove(name)
    }

    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<LogPluginDescriptor> {
        self.plugins.read().get(name).cloned()
    }

    #[must_use]
    pub fn plugins(&self) -> Vec<LogPluginDescriptor> {
        self.plugins.read().values().cloned().collect()
    }

    /// Register an instance; returns false when the id is taken.
    pub fn register_instance(&self, id: impl Into<String>, plugin: impl Into<String>) -> bool {
        let mut instances = self.instances.write();
        let id = id.into();
        if instances.contains_key(&id) {
            return false;
        }
        instances.insert(id, plugin.into());
        true
    }

    pub fn remove_instance(&self, id: &str) -> Option<String> {
        self.instances.write().remove(id)
    }

    /// Plugin name of a configured instance.
    #[must_use]
    pub fn instance_plugin(&self, id: &str) -> Option<String> {
        self.instances.read().get(id).cloned()
    }

    /// `(instance id, plugin name)` pairs, ordered by id.
    #[must_use]
    pub fn instances(&self) -> Vec<(String, String)> {
        self.instances
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether any configured instance uses the named plugin.
    #[must_use]
    pub fn plugin_in_use(&self, name: &str) -> bool {
        self.instances.read().values().any(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::{ConfigParam, LogPluginDescriptor, LogPluginRegistry, ParamKind};

    #[test]
    fn config_param_round_trips_its_wire_form() {
        let param = ConfigParam::parse("level", "integer;3;log verbosity").unwrap();
        assert_eq!(param.kind, ParamKind::Integer);
        assert_eq!(param.default, "3");
        assert_eq!(param.render(), "integer;3;log verbosity");
    }

    #[test]
    fn config_param_rejects_unknown_kind() {
        assert!(ConfigParam::parse("level", "float;3;").is_err());
    }

    #[test]
    fn duplicate_registrations_are_rejected() {
        let registry = LogPluginRegistry::new();
        assert!(registry.register_plugin(LogPluginDescriptor::new("RollingLogFile", "RollingLogFile")));
        assert!(!registry.register_plugin(LogPluginDescriptor::new("RollingLogFile", "Other")));
        assert!(registry.register_instance("audit", "RollingLogFile"));
        assert!(!registry.register_instance("audit", "RollingLogFile"));
    }

    #[test]
    fn plugin_in_use_tracks_instances() {
        let registry = LogPluginRegistry::new();
        assert!(registry.register_plugin(LogPluginDescriptor::new("RollingLogFile", "RollingLogFile")));
        assert!(!registry.plugin_in_use("RollingLogFile"));
        assert!(registry.register_instance("audit", "RollingLogFile"));
        assert!(registry.plugin_in_use("RollingLogFile"));
        registry.remove_instance("audit");
        assert!(!registry.plugin_in_use("RollingLogFile"));
    }
}
