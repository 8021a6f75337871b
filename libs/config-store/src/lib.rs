//! Hierarchical configuration store.
//!
//! A tree of named sub-stores, each holding flat string key/value pairs.
//! Durable persistence goes through an injected [`CommitSink`]; the store
//! itself is in-memory. `remove_substore` is the rollback primitive used by
//! handlers that must undo an in-memory registration after a failed commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Commit failure reported by the sink.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("commit failed: {0}")]
pub struct CommitError(pub String);

/// Persistence seam for [`ConfigStore::commit`].
///
/// Receives the full tree flattened into dotted keys, ordered.
pub trait CommitSink: Send + Sync {
    /// Persist a snapshot of the store.
    ///
    /// # Errors
    ///
    /// Returns `CommitError` when the snapshot could not be made durable;
    /// the in-memory tree is left untouched either way.
    fn persist(&self, entries: &[(String, String)], create_backup: bool) -> Result<(), CommitError>;
}

/// Sink that accepts every commit. Default for embedders that keep the store
/// purely in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllSink;

impl CommitSink for AcceptAllSink {
    fn persist(&self, _entries: &[(String, String)], _create_backup: bool) -> Result<(), CommitError> {
        Ok(())
    }
}

#[derive(Default)]
struct Node {
    values: BTreeMap<String, String>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn descend(&self, path: &[String]) -> Option<&Node> {
        let mut node = self;
        for seg in path {
            node = node.children.get(seg)?;
        }
        Some(node)
    }

    fn descend_mut_create(&mut self, path: &[String]) -> &mut Node {
        let mut node = self;
        for seg in path {
            node = node.children.entry(seg.clone()).or_default();
        }
        node
    }

    fn flatten(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for (k, v) in &self.values {
            let key = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            out.push((key, v.clone()));
        }
        for (name, child) in &self.children {
            let child_prefix = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            child.flatten(&child_prefix, out);
        }
    }
}

/// Process-wide configuration store shared by all admin facilities.
#[derive(Clone)]
pub struct ConfigStore {
    tree: Arc<RwLock<Node>>,
    sink: Arc<dyn CommitSink>,
}

impl ConfigStore {
    #[must_use]
    pub fn new(sink: Arc<dyn CommitSink>) -> Self {
        Self {
            tree: Arc::new(RwLock::new(Node::default())),
            sink,
        }
    }

    /// Store with the accept-everything sink.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(AcceptAllSink))
    }

    /// Handle on the root sub-store.
    #[must_use]
    pub fn root(&self) -> Substore {
        Substore {
            store: self.clone(),
            path: Vec::new(),
        }
    }

    /// Flush the tree through the commit sink.
    ///
    /// # Errors
    ///
    /// Propagates the sink's `CommitError`; the in-memory tree is unchanged.
    pub fn commit(&self, create_backup: bool) -> Result<(), CommitError> {
        let mut entries = Vec::new();
        self.tree.read().flatten("", &mut entries);
        self.sink.persist(&entries, create_backup)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

/// Cheap handle on one section of the tree.
#[derive(Debug, Clone)]
pub struct Substore {
    store: ConfigStore,
    path: Vec<String>,
}

impl Substore {
    /// Dotted name of this section, empty for the root.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let tree = self.store.tree.read();
        tree.descend(&self.path)?.values.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut tree = self.store.tree.write();
        tree.descend_mut_create(&self.path)
            .values
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut tree = self.store.tree.write();
        let node = descend_mut(&mut tree, &self.path)?;
        node.values.remove(key)
    }

    /// Keys of this section, ordered.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let tree = self.store.tree.read();
        tree.descend(&self.path)
            .map(|n| n.values.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Flat snapshot of this section's values, ordered by key.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        let tree = self.store.tree.read();
        tree.descend(&self.path)
            .map(|n| n.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Existing child section, if any.
    #[must_use]
    pub fn substore(&self, name: &str) -> Option<Substore> {
        let tree = self.store.tree.read();
        let node = tree.descend(&self.path)?;
        if node.children.contains_key(name) {
            let mut path = self.path.clone();
            path.push(name.to_owned());
            Some(Substore {
                store: self.store.clone(),
                path,
            })
        } else {
            None
        }
    }

    /// Create (or open) a child section.
    #[must_use]
    pub fn make_substore(&self, name: &str) -> Substore {
        {
            let mut tree = self.store.tree.write();
            let mut path = self.path.clone();
            path.push(name.to_owned());
            let _ = tree.descend_mut_create(&path);
        }
        let mut path = self.path.clone();
        path.push(name.to_owned());
        Substore {
            store: self.store.clone(),
            path,
        }
    }

    /// Remove a child section and everything under it.
    ///
    /// Returns whether the section existed.
    pub fn remove_substore(&self, name: &str) -> bool {
        let mut tree = self.store.tree.write();
        match descend_mut(&mut tree, &self.path) {
            Some(node) => node.children.remove(name).is_some(),
            None => false,
        }
    }

    /// Names of the child sections, ordered.
    #[must_use]
    pub fn substore_names(&self) -> Vec<String> {
        let tree = self.store.tree.read();
        tree.descend(&self.path)
            .map(|n| n.children.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn descend_mut<'a>(node: &'a mut Node, path: &[String]) -> Option<&'a mut Node> {
    let mut node = node;
    for seg in path {
        node = node.children.get_mut(seg)?;
    }
    Some(node)
}
