//! Audit emission helpers.
//!
//! The gate and the admin facilities emit through [`AuditLogger`], which
//! renders each record's fixed template and forwards the record to the
//! configured sink. Exactly one record per terminal outcome is the contract;
//! the helpers here only shape records, the call sites own the symmetry.

use std::sync::Arc;

use admin_gate_sdk::{AuditEventKind, AuditOutcome, AuditRecord, AuditSink};
use gate_security::AuthScheme;

/// Sink that writes formatted records to the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, record: &AuditRecord) {
        tracing::info!(target: "audit", "{}", record.format());
    }
}

/// Shared handle on the audit sink with per-kind emit helpers.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, record: AuditRecord) {
        tracing::debug!(line = %record.format(), "audit record");
        self.sink.emit(&record);
    }

    pub fn auth_fail(&self, subject: &str, scheme: AuthScheme) {
        self.emit(
            AuditRecord::new(AuditEventKind::AuthFail, subject, AuditOutcome::Failure)
                .with_param("AuthMgr", scheme.as_str()),
        );
    }

    pub fn auth_success(&self, subject: &str, scheme: AuthScheme) {
        self.emit(
            AuditRecord::new(AuditEventKind::AuthSuccess, subject, AuditOutcome::Success)
                .with_param("AuthMgr", scheme.as_str()),
        );
    }

    pub fn authz_success(&self, subject: &str, authz_mgr: &str, resource: &str, operation: &str) {
        self.emit(
            AuditRecord::new(AuditEventKind::AuthzSuccess, subject, AuditOutcome::Success)
                .with_param("AuthzMgr", authz_mgr)
                .with_param("Resource", resource)
                .with_param("Operation", operation),
        );
    }

    pub fn authz_fail(&self, subject: &str, authz_mgr: &str, resource: &str, operation: &str) {
        self.emit(
            AuditRecord::new(AuditEventKind::AuthzFail, subject, AuditOutcome::Failure)
                .with_param("AuthzMgr", authz_mgr)
                .with_param("Resource", resource)
                .with_param("Operation", operation),
        );
    }

    /// `ROLE_ASSUME` carries the set of groups the identity belongs to on
    /// success; an empty set on failure.
    pub fn role_assume(&self, subject: &str, outcome: AuditOutcome, groups: &[String]) {
        self.emit(
            AuditRecord::new(AuditEventKind::RoleAssume, subject, outcome)
                .with_param("Groups", groups.join(",")),
        );
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use admin_gate_sdk::{AuditEventKind, AuditOutcome, AuditTrail};
    use gate_security::AuthScheme;

    use super::AuditLogger;

    #[test]
    fn helpers_tag_records_with_scheme_and_outcome() {
        let trail = Arc::new(AuditTrail::new());
        let logger = AuditLogger::new(trail.clone());

        logger.auth_fail("admin", AuthScheme::BasicAuth);
        logger.role_assume(
            "admin",
            AuditOutcome::Success,
            &["Administrators".to_owned(), "Auditors".to_owned()],
        );

        let records = trail.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind(), AuditEventKind::AuthFail);
        assert_eq!(records[0].param("AuthMgr"), Some("passwdUserDBAuthMgr"));
        assert_eq!(records[1].param("Groups"), Some("Administrators,Auditors"));
    }
}
