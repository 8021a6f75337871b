//! In-memory user/group directory.
//!
//! Implements [`DirectoryClient`] over two concurrent maps. Used by tests and
//! small single-node deployments; the production directory sits behind the
//! same trait.

mod store;

pub use store::MemDirectory;
