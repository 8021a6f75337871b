//! Audit record types and the sink interface.
//!
//! Records are immutable and append-only. Every audited operation produces
//! exactly one record per terminal outcome; the sink must not be able to
//! retract or rewrite one.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Fixed message-kind identifiers of the signed audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    AuthFail,
    AuthSuccess,
    AuthzFail,
    AuthzSuccess,
    RoleAssume,
    /// Role membership / user / group change.
    ConfigRole,
    /// Log destination configuration change.
    ConfigLog,
}

impl AuditEventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEventKind::AuthFail => "AUTH_FAIL",
            AuditEventKind::AuthSuccess => "AUTH_SUCCESS",
            AuditEventKind::AuthzFail => "AUTHZ_FAIL",
            AuditEventKind::AuthzSuccess => "AUTHZ_SUCCESS",
            AuditEventKind::RoleAssume => "ROLE_ASSUME",
            AuditEventKind::ConfigRole => "CONFIG_ROLE",
            AuditEventKind::ConfigLog => "CONFIG_LOG",
        }
    }
}

/// Outcome field of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Success => "Success",
            AuditOutcome::Failure => "Failure",
        }
    }
}

/// One immutable line of the audit trail.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    kind: AuditEventKind,
    subject: String,
    outcome: AuditOutcome,
    params: Vec<(String, String)>,
    at: DateTime<Utc>,
}

impl AuditRecord {
    #[must_use]
    pub fn new(kind: AuditEventKind, subject: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            kind,
            subject: subject.into(),
            outcome,
            params: Vec::new(),
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Render the fixed template for this record's kind: bracketed
    /// `key=value` fields, ordered.
    #[must_use]
    pub fn format(&self) -> String {
        let mut line = format!(
            "[AuditEvent={}][SubjectID={}][Outcome={}]",
            self.kind.as_str(),
            self.subject,
            self.outcome.as_str()
        );
        for (name, value) in &self.params {
            line.push('[');
            line.push_str(name);
            line.push('=');
            line.push_str(value);
            line.push(']');
        }
        line
    }
}

/// Append-only audit destination.
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: &AuditRecord);
}

/// In-memory recorder, primarily for tests and embedders that forward the
/// trail elsewhere.
#[derive(Default)]
pub struct AuditTrail {
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries, in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn count_kind(&self, kind: AuditEventKind) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }

    #[must_use]
    pub fn last(&self) -> Option<AuditRecord> {
        self.records.lock().last().cloned()
    }
}

impl AuditSink for AuditTrail {
    fn emit(&self, record: &AuditRecord) {
        self.records.lock().push(record.clone());
    }
}
