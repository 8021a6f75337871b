//! User and group administration.
//!
//! Directory CRUD run through the admin gate, with multi-role enforcement on
//! group membership: a user may belong to at most one of the enforced
//! administrative groups. Every role-affecting mutation emits exactly one
//! `CONFIG_ROLE` audit record, success or failure.

pub mod ops;

pub use ops::{FACILITY, RESOURCE, UsrGrpAdmin, scopes};
