//! Domain models shared between the gate, the facilities, and the plugins.

use serde::{Deserialize, Serialize};

pub use gate_security::User;

/// Group record with its member uids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub members: Vec<String>,
}

impl Group {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_member(&self, uid: &str) -> bool {
        self.members.iter().any(|m| m == uid)
    }
}
