//! The admin gate: the per-request pipeline every administrative operation
//! passes through before it may mutate state.
//!
//! Pipeline order: credential extraction → identity resolution →
//! session binding → authorization decision → operation dispatch → audit
//! emission → response serialization. The gate owns the first five stages
//! and the audit discipline around them; the admin facilities own the
//! operation handlers and the audited-mutation protocol inside them.

pub mod api;
pub mod config;
pub mod domain;

pub use api::rest::{AdminState, PeerChain, admin_router};
pub use config::GateConfig;
pub use domain::audit::{AuditLogger, TracingAuditSink};
pub use domain::dispatch::{
    DispatchOutcome, OperationEntry, OperationHandler, OperationTable,
};
pub use domain::error::GateError;
pub use domain::gate::Gate;
pub use domain::request::{AdminRequest, OpType, params};
pub use domain::validate::validate_admin_id;
