//! Log destination administration.
//!
//! CRUD over log plugin descriptors and their configured instances, run
//! through the admin gate's dispatch pipeline. Every mutating operation
//! follows the audited-mutation protocol: validate, check preconditions,
//! mutate, commit, and on commit failure roll the in-memory change back
//! before reporting. Each terminal path of a mutation emits exactly one
//! `CONFIG_LOG` audit record.

pub mod ops;
pub mod registry;

pub use ops::{FACILITY, LogAdmin, RESOURCE, scopes};
pub use registry::{ConfigParam, LogPluginDescriptor, LogPluginRegistry, ParamKind};
