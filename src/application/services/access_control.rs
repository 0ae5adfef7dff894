use std::collections::HashSet;

use crate::infrastructure::config::AccessConfig;

/// Allow-list based authorization.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    approved: HashSet<String>,
    admins: HashSet<String>,
    admin_only_writes: bool,
}

impl AccessControl {
    pub fn new<I, S>(approved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            approved: approved.into_iter().map(Into::into).collect(),
            admins: HashSet::new(),
            admin_only_writes: false,
        }
    }

    /// Require admin membership for price changes
    pub fn with_admins<I, S>(mut self, admins: I, enforce: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admins = admins.into_iter().map(Into::into).collect();
        self.admin_only_writes = enforce;
        self
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.approved_users.iter().cloned())
            .with_admins(config.admin_users.iter().cloned(), config.admin_only_writes)
    }

    /// Whether the requester may talk to the bot at all.
    /// Missing and empty usernames are never approved.
    pub fn is_approved(&self, username: Option<&str>) -> bool {
        match username {
            Some(name) if !name.is_empty() => self.approved.contains(name),
            _ => false,
        }
    }

    /// Whether the requester may add, update or delete prices
    pub fn can_administer(&self, username: Option<&str>) -> bool {
        if !self.is_approved(username) {
            return false;
        }
        if !self.admin_only_writes {
            return true;
        }
        username.is_some_and(|name| self.admins.contains(name))
    }

    /// True while any approved user may change prices
    pub fn writes_open_to_all(&self) -> bool {
        !self.admin_only_writes
    }

    pub fn approved_count(&self) -> usize {
        self.approved.len()
    }
}
