//! Concurrent map store behind [`DirectoryClient`].

use admin_gate_sdk::models::{Group, User};
use admin_gate_sdk::{DirectoryClient, DirectoryError};
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

/// In-memory directory keyed by uid and group name.
///
/// Removing a user also strips it from every group's member list so that
/// membership scans never see a dangling uid.
#[derive(Debug, Default)]
pub struct MemDirectory {
    users: DashMap<String, User>,
    groups: DashMap<String, Group>,
}

impl MemDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with users and groups, replacing existing entries.
    pub fn seed(&self, users: impl IntoIterator<Item = User>, groups: impl IntoIterator<Item = Group>) {
        for user in users {
            self.users.insert(user.uid.clone(), user);
        }
        for group in groups {
            self.groups.insert(group.name.clone(), group);
        }
    }
}

#[async_trait]
impl DirectoryClient for MemDirectory {
    async fn get_user(&self, uid: &str) -> Result<User, DirectoryError> {
        self.users
            .get(uid)
            .map(|u| u.clone())
            .ok_or_else(|| DirectoryError::user_not_found(uid))
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(users)
    }

    async fn add_user(&self, user: User) -> Result<(), DirectoryError> {
        match self.users.entry(user.uid.clone()) {
            Entry::Occupied(_) => {
                Err(DirectoryError::conflict(format!("user exists: {}", user.uid)))
            }
            Entry::Vacant(slot) => {
                tracing::debug!(uid = %user.uid, "user added");
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn modify_user(&self, user: User) -> Result<(), DirectoryError> {
        match self.users.get_mut(&user.uid) {
            Some(mut slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(DirectoryError::user_not_found(&user.uid)),
        }
    }

    async fn remove_user(&self, uid: &str) -> Result<(), DirectoryError> {
        if self.users.remove(uid).is_none() {
            return Err(DirectoryError::user_not_found(uid));
        }
        for mut group in self.groups.iter_mut() {
            group.members.retain(|m| m != uid);
        }
        tracing::debug!(uid = %uid, "user removed");
        Ok(())
    }

    async fn get_group(&self, name: &str) -> Result<Group, DirectoryError> {
        self.groups
            .get(name)
            .map(|g| g.clone())
            .ok_or_else(|| DirectoryError::group_not_found(name))
    }

    async fn list_groups(&self, filter: Option<&str>) -> Result<Vec<Group>, DirectoryError> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|g| filter.is_none_or(|f| g.name.contains(f)))
            .map(|g| g.clone())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn find_groups(&self, member_uid: &str) -> Result<Vec<String>, DirectoryError> {
        let mut names: Vec<String> = self
            .groups
            .iter()
            .filter(|g| g.is_member(member_uid))
            .map(|g| g.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn add_group(&self, group: Group) -> Result<(), DirectoryError> {
        match self.groups.entry(group.name.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::conflict(format!(
                "group exists: {}",
                group.name
            ))),
            Entry::Vacant(slot) => {
                tracing::debug!(group = %group.name, "group added");
                slot.insert(group);
                Ok(())
            }
        }
    }

    async fn modify_group(&self, group: Group) -> Result<(), DirectoryError> {
        match self.groups.get_mut(&group.name) {
            Some(mut slot) => {
                *slot = group;
                Ok(())
            }
            None => Err(DirectoryError::group_not_found(&group.name)),
        }
    }

    async fn remove_group(&self, name: &str) -> Result<(), DirectoryError> {
        self.groups
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::group_not_found(name))
    }

    async fn add_member(&self, group: &str, uid: &str) -> Result<(), DirectoryError> {
        if !self.users.contains_key(uid) {
            return Err(DirectoryError::user_not_found(uid));
        }
        let mut slot = self
            .groups
            .get_mut(group)
            .ok_or_else(|| DirectoryError::group_not_found(group))?;
        if slot.is_member(uid) {
            return Err(DirectoryError::conflict(format!(
                "already a member of {group}: {uid}"
            )));
        }
        slot.members.push(uid.to_owned());
        Ok(())
    }

    async fn remove_member(&self, group: &str, uid: &str) -> Result<(), DirectoryError> {
        let mut slot = self
            .groups
            .get_mut(group)
            .ok_or_else(|| DirectoryError::group_not_found(group))?;
        if !slot.is_member(uid) {
            return Err(DirectoryError::user_not_found(uid));
        }
        slot.members.retain(|m| m != uid);
        Ok(())
    }
}
