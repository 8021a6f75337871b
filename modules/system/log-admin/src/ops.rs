//! Operation handlers for the log facility.

use std::sync::Arc;

use admin_gate::{
    AdminRequest, AuditLogger, OperationEntry, OperationHandler, OperationTable, OpType,
    validate_admin_id,
};
use admin_gate_sdk::{AuditEventKind, AuditOutcome, AuditRecord};
use async_trait::async_trait;
use config_store::{ConfigStore, Substore};
use gate_security::wire::is_sensitive_param;
use gate_security::{OperationResult, SessionContext};

use crate::registry::{ConfigParam, LogPluginDescriptor, LogPluginRegistry, ParamKind};

/// Facility name used in the admin URL.
pub const FACILITY: &str = "log";

/// Resource all log operations are authorized against.
pub const RESOURCE: &str = "certServer.log.configuration";

/// Operation scopes of this facility.
pub mod scopes {
    /// Configured log destination instances.
    pub const RULES: &str = "logRules";
    /// Registered destination implementations.
    pub const RULE_IMPLS: &str = "logRuleImpls";
}

const PARAM_IMPL_NAME: &str = "implName";
const PARAM_CLASS_NAME: &str = "className";

/// The log administration facility.
///
/// Holds the injected plugin registry, the shared configuration store, and
/// the audit logger. One instance backs every operation of its table;
/// mutating operations are serialized by the table's lock.
pub struct LogAdmin {
    registry: Arc<LogPluginRegistry>,
    store: ConfigStore,
    audit: AuditLogger,
}

impl LogAdmin {
    #[must_use]
    pub fn new(registry: Arc<LogPluginRegistry>, store: ConfigStore, audit: AuditLogger) -> Self {
        Self {
            registry,
            store,
            audit,
        }
    }

    /// Build this facility's operation table.
    #[must_use]
    pub fn table(self: &Arc<Self>) -> OperationTable {
        let handler: Arc<dyn OperationHandler> = Arc::<Self>::clone(self);
        let entry = |operation: &str, mutating: bool| {
            OperationEntry::new(RESOURCE, operation, mutating, Arc::clone(&handler))
        };
        OperationTable::new(FACILITY)
            .operation(scopes::RULES, OpType::Read, entry("read", false))
            .operation(scopes::RULES, OpType::Search, entry("read", false))
            .operation(scopes::RULES, OpType::Add, entry("modify", true))
            .operation(scopes::RULES, OpType::Modify, entry("modify", true))
            .operation(scopes::RULES, OpType::Delete, entry("modify", true))
            .operation(scopes::RULE_IMPLS, OpType::Search, entry("read", false))
            .operation(scopes::RULE_IMPLS, OpType::Add, entry("modify", true))
            .operation(scopes::RULE_IMPLS, OpType::Delete, entry("modify", true))
    }

    fn instance_section(&self) -> Substore {
        self.store.root().make_substore(FACILITY).make_substore("instance")
    }

    fn impl_section(&self) -> Substore {
        self.store.root().make_substore(FACILITY).make_substore("impl")
    }

    /// One `CONFIG_LOG` record per terminal path of a mutation.
    fn audit_change(
        &self,
        subject: &str,
        outcome: AuditOutcome,
        scope: &str,
        id: &str,
        snapshot: &[(String, String)],
    ) {
        let mut record = AuditRecord::new(AuditEventKind::ConfigLog, subject, outcome)
            .with_param("Scope", scope)
            .with_param("Id", id);
        for (name, value) in snapshot {
            if !is_sensitive_param(name) {
                record = record.with_param(name, value);
            }
        }
        self.audit.emit(record);
    }

    fn fail(
        &self,
        subject: &str,
        scope: &str,
        id: &str,
        snapshot: &[(String, String)],
        message: impl Into<String>,
    ) -> OperationResult {
        let message = message.into();
        self.audit_change(subject, AuditOutcome::Failure, scope, id, snapshot);
        OperationResult::error(message)
    }

    // -- logRules ---------------------------------------------------------

    fn read_instance(&self, req: &AdminRequest) -> OperationResult {
        let Some(id) = req.rs_id() else {
            return OperationResult::error("missing instance id");
        };
        let Some(section) = self.instance_section().substore(id) else {
            return OperationResult::error(format!("unknown log instance: {id}"));
        };
        let mut result = OperationResult::success();
        for (name, value) in section.entries() {
            result.push_param(name, value);
        }
        result
    }

    fn list_instances(&self) -> OperationResult {
        let mut result = OperationResult::success();
        for (id, plugin) in self.registry.instances() {
            result.push_param(id, plugin);
        }
        result
    }

    fn add_instance(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let snapshot = audit_snapshot(req, None);
        let Some(id) = req.rs_id() else {
            return self.fail(subject, scopes::RULES, "", &snapshot, "missing instance id");
        };
        if let Err(e) = validate_admin_id(id) {
            return self.fail(subject, scopes::RULES, id, &snapshot, e.to_string());
        }
        let Some(impl_name) = req.param(PARAM_IMPL_NAME) else {
            return self.fail(
                subject,
                scopes::RULES,
                id,
                &snapshot,
                format!("missing parameter {PARAM_IMPL_NAME}"),
            );
        };
        let Some(descriptor) = self.registry.plugin(impl_name) else {
            return self.fail(
                subject,
                scopes::RULES,
                id,
                &snapshot,
                format!("unregistered log plugin: {impl_name}"),
            );
        };
        let snapshot = audit_snapshot(req, Some(&descriptor));
        let parent = self.instance_section();
        if self.registry.instance_plugin(id).is_some() || parent.substore(id).is_some() {
            return self.fail(
                subject,
                scopes::RULES,
                id,
                &snapshot,
                format!("log instance already exists: {id}"),
            );
        }

        let section = parent.make_substore(id);
        section.set(PARAM_IMPL_NAME, impl_name);
        for param in &descriptor.schema {
            let value = req.param(&param.name).unwrap_or(&param.default);
            section.set(param.name.clone(), value);
        }
        // Registered in memory before the commit; both are undone if the
        // commit fails.
        let _ = self.registry.register_instance(id, impl_name);

        if let Err(e) = self.store.commit(true) {
            parent.remove_substore(id);
            let _ = self.registry.remove_instance(id);
            return self.fail(subject, scopes::RULES, id, &snapshot, e.to_string());
        }

        tracing::info!(id = %id, plugin = %impl_name, "log instance added");
        self.audit_change(subject, AuditOutcome::Success, scopes::RULES, id, &snapshot);
        OperationResult::success().with_param(PARAM_IMPL_NAME, impl_name)
    }

    fn modify_instance(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let snapshot = audit_snapshot(req, None);
        let Some(id) = req.rs_id() else {
            return self.fail(subject, scopes::RULES, "", &snapshot, "missing instance id");
        };
        let Some(section) = self.instance_section().substore(id) else {
            return self.fail(
                subject,
                scopes::RULES,
                id,
                &snapshot,
                format!("unknown log instance: {id}"),
            );
        };
        // Re-filter once the instance's plugin is known, so Password-kind
        // schema parameters stay out of the record.
        let descriptor = self
            .registry
            .instance_plugin(id)
            .and_then(|plugin| self.registry.plugin(&plugin));
        let snapshot = audit_snapshot(req, descriptor.as_ref());

        let previous = section.entries();
        for (name, value) in req.payload_params() {
            if name != PARAM_IMPL_NAME {
                section.set(name, value);
            }
        }

        if let Err(e) = self.store.commit(true) {
            restore_entries(&section, &previous);
            return self.fail(subject, scopes::RULES, id, &snapshot, e.to_string());
        }

        self.audit_change(subject, AuditOutcome::Success, scopes::RULES, id, &snapshot);
        OperationResult::restart("log configuration takes effect on restart")
    }

    fn delete_instance(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let snapshot = audit_snapshot(req, None);
        let Some(id) = req.rs_id() else {
            return self.fail(subject, scopes::RULES, "", &snapshot, "missing instance id");
        };
        let Some(plugin) = self.registry.instance_plugin(id) else {
            return self.fail(
                subject,
                scopes::RULES,
                id,
                &snapshot,
                format!("unknown log instance: {id}"),
            );
        };
        let snapshot = audit_snapshot(req, self.registry.plugin(&plugin).as_ref());

        let parent = self.instance_section();
        let previous = parent.substore(id).map(|s| s.entries()).unwrap_or_default();
        parent.remove_substore(id);
        let _ = self.registry.remove_instance(id);

        if let Err(e) = self.store.commit(true) {
            restore_entries(&parent.make_substore(id), &previous);
            let _ = self.registry.register_instance(id, plugin);
            return self.fail(subject, scopes::RULES, id, &snapshot, e.to_string());
        }

        tracing::info!(id = %id, "log instance removed");
        self.audit_change(subject, AuditOutcome::Success, scopes::RULES, id, &snapshot);
        OperationResult::success()
    }

    // -- logRuleImpls -----------------------------------------------------

    fn list_plugins(&self) -> OperationResult {
        let mut result = OperationResult::success();
        for descriptor in self.registry.plugins() {
            result.push_param(descriptor.name.clone(), descriptor.class_name.clone());
            for param in &descriptor.schema {
                result.push_param(format!("{}.{}", descriptor.name, param.name), param.render());
            }
        }
        result
    }

    fn add_plugin(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let snapshot = audit_snapshot(req, None);
        let Some(id) = req.rs_id() else {
            return self.fail(subject, scopes::RULE_IMPLS, "", &snapshot, "missing plugin id");
        };
        if let Err(e) = validate_admin_id(id) {
            return self.fail(subject, scopes::RULE_IMPLS, id, &snapshot, e.to_string());
        }
        let Some(class_name) = req.param(PARAM_CLASS_NAME) else {
            return self.fail(
                subject,
                scopes::RULE_IMPLS,
                id,
                &snapshot,
                format!("missing parameter {PARAM_CLASS_NAME}"),
            );
        };
        if self.registry.plugin(id).is_some() {
            return self.fail(
                subject,
                scopes::RULE_IMPLS,
                id,
                &snapshot,
                format!("log plugin already exists: {id}"),
            );
        }

        let mut descriptor = LogPluginDescriptor::new(id, class_name);
        for (name, spec) in req.payload_params() {
            if name == PARAM_CLASS_NAME {
                continue;
            }
            match ConfigParam::parse(name, &spec) {
                Ok(param) => descriptor.schema.push(param),
                Err(e) => return self.fail(subject, scopes::RULE_IMPLS, id, &snapshot, e),
            }
        }

        let section = self.impl_section().make_substore(id);
        section.set(PARAM_CLASS_NAME, class_name);
        for param in &descriptor.schema {
            section.set(param.name.clone(), param.render());
        }
        let _ = self.registry.register_plugin(descriptor);

        if let Err(e) = self.store.commit(true) {
            self.impl_section().remove_substore(id);
            let _ = self.registry.remove_plugin(id);
            return self.fail(subject, scopes::RULE_IMPLS, id, &snapshot, e.to_string());
        }

        tracing::info!(id = %id, class = %class_name, "log plugin registered");
        self.audit_change(subject, AuditOutcome::Success, scopes::RULE_IMPLS, id, &snapshot);
        OperationResult::success()
    }

    fn delete_plugin(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let snapshot = audit_snapshot(req, None);
        let Some(id) = req.rs_id() else {
            return self.fail(subject, scopes::RULE_IMPLS, "", &snapshot, "missing plugin id");
        };
        let Some(descriptor) = self.registry.plugin(id) else {
            return self.fail(
                subject,
                scopes::RULE_IMPLS,
                id,
                &snapshot,
                format!("unknown log plugin: {id}"),
            );
        };
        if self.registry.plugin_in_use(id) {
            return self.fail(
                subject,
                scopes::RULE_IMPLS,
                id,
                &snapshot,
                format!("log plugin in use by configured instances: {id}"),
            );
        }

        let parent = self.impl_section();
        let previous = parent.substore(id).map(|s| s.entries()).unwrap_or_default();
        parent.remove_substore(id);
        let _ = self.registry.remove_plugin(id);

        if let Err(e) = self.store.commit(true) {
            restore_entries(&parent.make_substore(id), &previous);
            let _ = self.registry.register_plugin(descriptor);
            return self.fail(subject, scopes::RULE_IMPLS, id, &snapshot, e.to_string());
        }

        self.audit_change(subject, AuditOutcome::Success, scopes::RULE_IMPLS, id, &snapshot);
        OperationResult::success()
    }
}

#[async_trait]
impl OperationHandler for LogAdmin {
    async fn handle(&self, session: &SessionContext, req: &AdminRequest) -> OperationResult {
        let subject = session.user_id();
        match (req.scope(), req.op_type()) {
            (Some(scopes::RULES), Some(OpType::Read)) => self.read_instance(req),
            (Some(scopes::RULES), Some(OpType::Search)) => self.list_instances(),
            (Some(scopes::RULES), Some(OpType::Add)) => self.add_instance(subject, req),
            (Some(scopes::RULES), Some(OpType::Modify)) => self.modify_instance(subject, req),
            (Some(scopes::RULES), Some(OpType::Delete)) => self.delete_instance(subject, req),
            (Some(scopes::RULE_IMPLS), Some(OpType::Search)) => self.list_plugins(),
            (Some(scopes::RULE_IMPLS), Some(OpType::Add)) => self.add_plugin(subject, req),
            (Some(scopes::RULE_IMPLS), Some(OpType::Delete)) => self.delete_plugin(subject, req),
            _ => OperationResult::error("unsupported log operation"),
        }
    }
}

impl std::fmt::Debug for LogAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogAdmin").finish_non_exhaustive()
    }
}

/// Request parameters safe to carry in an audit record: the payload minus
/// name-sensitive values and schema parameters of password kind.
fn audit_snapshot(
    req: &AdminRequest,
    descriptor: Option<&LogPluginDescriptor>,
) -> Vec<(String, String)> {
    req.payload_params()
        .into_iter()
        .filter(|(name, _)| {
            if is_sensitive_param(name) {
                return false;
            }
            descriptor.is_none_or(|d| {
                d.schema
                    .iter()
                    .all(|p| p.name != *name || p.kind != ParamKind::Password)
            })
        })
        .collect()
}

fn restore_entries(section: &Substore, entries: &[(String, String)]) {
    for key in section.keys() {
        let _ = section.remove(&key);
    }
    for (name, value) in entries {
        section.set(name.clone(), value.clone());
    }
}
