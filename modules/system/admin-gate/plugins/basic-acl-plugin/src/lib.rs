//! Basic ACL authorization plugin.
//!
//! Grants by group membership. Rules bind a `(resource, operation)` pair to a
//! list of groups; resources match on the longest dot-separated prefix so a
//! rule for `certServer.log` also covers `certServer.log.instances`.

pub mod config;
pub mod domain;

pub use config::{AclRule, BasicAclPluginConfig};
pub use domain::service::Service;
