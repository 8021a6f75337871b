//! Operation handlers for the user/group facility.

use std::sync::Arc;

use admin_gate::{
    AdminRequest, AuditLogger, OperationEntry, OperationHandler, OperationTable, OpType,
    validate_admin_id,
};
use admin_gate_sdk::models::{Group, User};
use admin_gate_sdk::{AuditEventKind, AuditOutcome, AuditRecord, DirectoryClient, DirectoryError};
use async_trait::async_trait;
use gate_security::wire::is_sensitive_param;
use gate_security::{OperationResult, SessionContext};

/// Facility name used in the admin URL.
pub const FACILITY: &str = "usrgrp";

/// Resource all user/group operations are authorized against.
pub const RESOURCE: &str = "certServer.usrgrp.administration";

/// Operation scopes of this facility.
pub mod scopes {
    pub const USERS: &str = "users";
    pub const GROUPS: &str = "groups";
    pub const GROUP_MEMBERS: &str = "groupMembers";
}

const PARAM_FULL_NAME: &str = "fullname";
const PARAM_EMAIL: &str = "email";
const PARAM_PHONE: &str = "phone";
const PARAM_STATE: &str = "state";
const PARAM_DESC: &str = "desc";
const PARAM_MEMBER: &str = "uid";
const PARAM_FILTER: &str = "filter";

/// The user/group administration facility.
///
/// `enforced` names the administrative groups subject to multi-role
/// enforcement: a uid may be a member of at most one of them.
pub struct UsrGrpAdmin {
    directory: Arc<dyn DirectoryClient>,
    audit: AuditLogger,
    enforced: Vec<String>,
}

impl UsrGrpAdmin {
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        audit: AuditLogger,
        enforced: Vec<String>,
    ) -> Self {
        Self {
            directory,
            audit,
            enforced,
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
            .operation(scopes::USERS, OpType::Search, entry("read", false))
            .operation(scopes::USERS, OpType::Read, entry("read", false))
            .operation(scopes::USERS, OpType::Add, entry("modify", true))
            .operation(scopes::USERS, OpType::Modify, entry("modify", true))
            .operation(scopes::USERS, OpType::Delete, entry("modify", true))
            .operation(scopes::GROUPS, OpType::Search, entry("read", false))
            .operation(scopes::GROUPS, OpType::Read, entry("read", false))
            .operation(scopes::GROUPS, OpType::Add, entry("modify", true))
            .operation(scopes::GROUPS, OpType::Modify, entry("modify", true))
            .operation(scopes::GROUPS, OpType::Delete, entry("modify", true))
            .operation(scopes::GROUP_MEMBERS, OpType::Read, entry("read", false))
            .operation(scopes::GROUP_MEMBERS, OpType::Add, entry("modify", true))
            .operation(scopes::GROUP_MEMBERS, OpType::Delete, entry("modify", true))
    }

    /// One `CONFIG_ROLE` record per terminal path of a mutation.
    fn audit_change(
        &self,
        subject: &str,
        outcome: AuditOutcome,
        scope: &str,
        id: &str,
        snapshot: &[(String, String)],
    ) {
        let mut record = AuditRecord::new(AuditEventKind::ConfigRole, subject, outcome)
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
        req: &AdminRequest,
        message: impl Into<String>,
    ) -> OperationResult {
        self.audit_change(
            subject,
            AuditOutcome::Failure,
            scope,
            id,
            &req.payload_params(),
        );
        OperationResult::error(message)
    }

    fn ok(&self, subject: &str, scope: &str, id: &str, req: &AdminRequest) -> OperationResult {
        self.audit_change(
            subject,
            AuditOutcome::Success,
            scope,
            id,
            &req.payload_params(),
        );
        OperationResult::success()
    }

    // -- users ------------------------------------------------------------

    async fn list_users(&self) -> OperationResult {
        match self.directory.list_users().await {
            Ok(users) => {
                let mut result = OperationResult::success();
                for user in users {
                    result.push_param(user.uid, user.full_name);
                }
                result
            }
            Err(e) => OperationResult::error(e.to_string()),
        }
    }

    async fn read_user(&self, req: &AdminRequest) -> OperationResult {
        let Some(uid) = req.rs_id() else {
            return OperationResult::error("missing user id");
        };
        match self.directory.get_user(uid).await {
            Ok(user) => OperationResult::success()
                .with_param(PARAM_FULL_NAME, user.full_name)
                .with_param(PARAM_EMAIL, user.email)
                .with_param(PARAM_PHONE, user.phone)
                .with_param(PARAM_STATE, user.state)
                // Certificates are elided to their count.
                .with_param("certificates", user.certificates.len().to_string()),
            Err(e) => OperationResult::error(e.to_string()),
        }
    }

    fn user_from_request(uid: &str, req: &AdminRequest) -> User {
        let field = |name: &str| req.param(name).unwrap_or_default().to_owned();
        User {
            uid: uid.to_owned(),
            full_name: field(PARAM_FULL_NAME),
            email: field(PARAM_EMAIL),
            phone: field(PARAM_PHONE),
            state: field(PARAM_STATE),
            certificates: Vec::new(),
        }
    }

    async fn add_user(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(uid) = req.rs_id() else {
            return self.fail(subject, scopes::USERS, "", req, "missing user id");
        };
        if let Err(e) = validate_admin_id(uid) {
            return self.fail(subject, scopes::USERS, uid, req, e.to_string());
        }
        match self.directory.add_user(Self::user_from_request(uid, req)).await {
            Ok(()) => {
                tracing::info!(uid = %uid, "user added");
                self.ok(subject, scopes::USERS, uid, req)
            }
            Err(e) => self.fail(subject, scopes::USERS, uid, req, e.to_string()),
        }
    }

    async fn modify_user(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(uid) = req.rs_id() else {
            return self.fail(subject, scopes::USERS, "", req, "missing user id");
        };
        // Certificates are managed elsewhere; carry the stored ones over.
        let certificates = match self.directory.get_user(uid).await {
            Ok(user) => user.certificates,
            Err(e) => return self.fail(subject, scopes::USERS, uid, req, e.to_string()),
        };
        let mut user = Self::user_from_request(uid, req);
        user.certificates = certificates;
        match self.directory.modify_user(user).await {
            Ok(()) => self.ok(subject, scopes::USERS, uid, req),
            Err(e) => self.fail(subject, scopes::USERS, uid, req, e.to_string()),
        }
    }

    /// A user who is the sole member of an enforced group cannot be removed;
    /// the system must never lose its last administrator.
    async fn sole_enforced_member(&self, uid: &str) -> Result<Option<String>, DirectoryError> {
        for name in &self.enforced {
            let group = match self.directory.get_group(name).await {
                Ok(group) => group,
                Err(DirectoryError::GroupNotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            if group.is_member(uid) && group.members.len() == 1 {
                return Ok(Some(group.name));
            }
        }
        Ok(None)
    }

    async fn delete_user(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(uid) = req.rs_id() else {
            return self.fail(subject, scopes::USERS, "", req, "missing user id");
        };
        match self.sole_enforced_member(uid).await {
            Ok(Some(group)) => {
                return self.fail(
                    subject,
                    scopes::USERS,
                    uid,
                    req,
                    format!("user is the only member of {group}"),
                );
            }
            Ok(None) => {}
            Err(e) => return self.fail(subject, scopes::USERS, uid, req, e.to_string()),
        }
        match self.directory.remove_user(uid).await {
            Ok(()) => {
                tracing::info!(uid = %uid, "user removed");
                self.ok(subject, scopes::USERS, uid, req)
            }
            Err(e) => self.fail(subject, scopes::USERS, uid, req, e.to_string()),
        }
    }

    // -- groups -----------------------------------------------------------

    async fn list_groups(&self, req: &AdminRequest) -> OperationResult {
        match self.directory.list_groups(req.param(PARAM_FILTER)).await {
            Ok(groups) => {
                let mut result = OperationResult::success();
                for group in groups {
                    result.push_param(group.name, group.description);
                }
                result
            }
            Err(e) => OperationResult::error(e.to_string()),
        }
    }

    async fn read_group(&self, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return OperationResult::error("missing group name");
        };
        match self.directory.get_group(name).await {
            Ok(group) => OperationResult::success()
                .with_param(PARAM_DESC, group.description)
                .with_param("members", group.members.join(";")),
            Err(e) => OperationResult::error(e.to_string()),
        }
    }

    async fn add_group(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return self.fail(subject, scopes::GROUPS, "", req, "missing group name");
        };
        if let Err(e) = validate_admin_id(name) {
            return self.fail(subject, scopes::GROUPS, name, req, e.to_string());
        }
        let mut group = Group::named(name);
        group.description = req.param(PARAM_DESC).unwrap_or_default().to_owned();
        match self.directory.add_group(group).await {
            Ok(()) => self.ok(subject, scopes::GROUPS, name, req),
            Err(e) => self.fail(subject, scopes::GROUPS, name, req, e.to_string()),
        }
    }

    async fn modify_group(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return self.fail(subject, scopes::GROUPS, "", req, "missing group name");
        };
        // Membership is managed through the groupMembers scope; only the
        // description is mutable here.
        let mut group = match self.directory.get_group(name).await {
            Ok(group) => group,
            Err(e) => return self.fail(subject, scopes::GROUPS, name, req, e.to_string()),
        };
        if let Some(desc) = req.param(PARAM_DESC) {
            group.description = desc.to_owned();
        }
        match self.directory.modify_group(group).await {
            Ok(()) => self.ok(subject, scopes::GROUPS, name, req),
            Err(e) => self.fail(subject, scopes::GROUPS, name, req, e.to_string()),
        }
    }

    async fn delete_group(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return self.fail(subject, scopes::GROUPS, "", req, "missing group name");
        };
        match self.directory.remove_group(name).await {
            Ok(()) => self.ok(subject, scopes::GROUPS, name, req),
            Err(e) => self.fail(subject, scopes::GROUPS, name, req, e.to_string()),
        }
    }

    // -- groupMembers -----------------------------------------------------

    async fn list_members(&self, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return OperationResult::error("missing group name");
        };
        match self.directory.get_group(name).await {
            Ok(group) => {
                let mut result = OperationResult::success();
                for member in group.members {
                    result.push_param(PARAM_MEMBER, member);
                }
                result
            }
            Err(e) => OperationResult::error(e.to_string()),
        }
    }

    /// Whether the uid already holds a different enforced role.
    ///
    /// Deliberately scans every group's member list rather than asking the
    /// directory for the uid's memberships; the full scan is the source
    /// system's semantics for this check.
    async fn holds_other_enforced_role(
        &self,
        uid: &str,
        target: &str,
    ) -> Result<bool, DirectoryError> {
        let groups = self.directory.list_groups(None).await?;
        for group in groups {
            if group.name != target
                && self.enforced.iter().any(|e| e == &group.name)
                && group.members.iter().any(|m| m == uid)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn add_member(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return self.fail(subject, scopes::GROUP_MEMBERS, "", req, "missing group name");
        };
        let Some(uid) = req.param(PARAM_MEMBER) else {
            return self.fail(
                subject,
                scopes::GROUP_MEMBERS,
                name,
                req,
                format!("missing parameter {PARAM_MEMBER}"),
            );
        };
        if self.enforced.iter().any(|e| e == name) {
            match self.holds_other_enforced_role(uid, name).await {
                Ok(true) => {
                    return self.fail(
                        subject,
                        scopes::GROUP_MEMBERS,
                        name,
                        req,
                        format!("duplicate roles: {uid} already holds an enforced role"),
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    return self.fail(subject, scopes::GROUP_MEMBERS, name, req, e.to_string());
                }
            }
        }
        match self.directory.add_member(name, uid).await {
            Ok(()) => {
                tracing::info!(group = %name, uid = %uid, "member added");
                self.ok(subject, scopes::GROUP_MEMBERS, name, req)
            }
            Err(e) => self.fail(subject, scopes::GROUP_MEMBERS, name, req, e.to_string()),
        }
    }

    async fn remove_member(&self, subject: &str, req: &AdminRequest) -> OperationResult {
        let Some(name) = req.rs_id() else {
            return self.fail(subject, scopes::GROUP_MEMBERS, "", req, "missing group name");
        };
        let Some(uid) = req.param(PARAM_MEMBER) else {
            return self.fail(
                subject,
                scopes::GROUP_MEMBERS,
                name,
                req,
                format!("missing parameter {PARAM_MEMBER}"),
            );
        };
        match self.directory.remove_member(name, uid).await {
            Ok(()) => self.ok(subject, scopes::GROUP_MEMBERS, name, req),
            Err(e) => self.fail(subject, scopes::GROUP_MEMBERS, name, req, e.to_string()),
        }
    }
}

#[async_trait]
impl OperationHandler for UsrGrpAdmin {
    async fn handle(&self, session: &SessionContext, req: &AdminRequest) -> OperationResult {
        let subject = session.user_id();
        match (req.scope(), req.op_type()) {
            (Some(scopes::USERS), Some(OpType::Search)) => self.list_users().await,
            (Some(scopes::USERS), Some(OpType::Read)) => self.read_user(req).await,
            (Some(scopes::USERS), Some(OpType::Add)) => self.add_user(subject, req).await,
            (Some(scopes::USERS), Some(OpType::Modify)) => self.modify_user(subject, req).await,
            (Some(scopes::USERS), Some(OpType::Delete)) => self.delete_user(subject, req).await,
            (Some(scopes::GROUPS), Some(OpType::Search)) => self.list_groups(req).await,
            (Some(scopes::GROUPS), Some(OpType::Read)) => self.read_group(req).await,
            (Some(scopes::GROUPS), Some(OpType::Add)) => self.add_group(subject, req).await,
            (Some(scopes::GROUPS), Some(OpType::Modify)) => self.modify_group(subject, req).await,
            (Some(scopes::GROUPS), Some(OpType::Delete)) => self.delete_group(subject, req).await,
            (Some(scopes::GROUP_MEMBERS), Some(OpType::Read)) => self.list_members(req).await,
            (Some(scopes::GROUP_MEMBERS), Some(OpType::Add)) => {
                self.add_member(subject, req).await
            }
            (Some(scopes::GROUP_MEMBERS), Some(OpType::Delete)) => {
                self.remove_member(subject, req).await
            }
            _ => OperationResult::error("unsupported user/group operation"),
        }
    }
}

impl std::fmt::Debug for UsrGrpAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsrGrpAdmin")
            .field("enforced", &self.enforced)
            .finish_non_exhaustive()
    }
}
