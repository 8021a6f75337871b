//! SDK for the admin gate.
//!
//! Defines the interfaces the gate consumes — authentication and
//! authorization plugins, the user/group directory, and the audit sink —
//! together with their models and errors. Plugins implement these traits;
//! the gate and the admin facilities are written against them.

pub mod api;
pub mod audit;
pub mod error;
pub mod models;

pub use api::{AuthnPluginClient, AuthzPluginClient, DirectoryClient};
pub use audit::{AuditEventKind, AuditOutcome, AuditRecord, AuditSink, AuditTrail};
pub use error::{AuthnError, DirectoryError};
pub use models::{Group, User};
