//! Static authentication plugin.
//!
//! Verifies credentials against configuration: uid/password entries for the
//! Basic scheme, subject-DN mappings for the certificate scheme. Intended
//! for development, tests, and small fixed admin populations; production
//! deployments back the same trait with the directory.

pub mod config;
pub mod domain;

pub use config::{CertMapping, StaticAuthnPluginConfig, UserEntry};
pub use domain::service::Service;
