//! In-memory storage implementation

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::traits::Store;
use crate::domain::entities::{Code, OutputMapping, Tier};
use crate::application::errors::StorageError;

/// Volatile store for tests and throwaway console sessions
#[derive(Default)]
pub struct MemoryStore {
    mappings: Arc<RwLock<BTreeMap<Code, OutputMapping>>>,
    users: Arc<RwLock<BTreeMap<String, Tier>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read calls served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add_output_mapping(&self, mapping: &OutputMapping) -> Result<(), StorageError> {
        let mut mappings = self.mappings.write().await;
        if mappings.contains_key(&mapping.code) {
            return Err(StorageError::AlreadyExists(mapping.code.to_string()));
        }
        mappings.insert(mapping.code.clone(), mapping.clone());
        Ok(())
    }

    async fn update_output_mapping(&self, mapping: &OutputMapping) -> Result<bool, StorageError> {
        let mut mappings = self.mappings.write().await;
        match mappings.get_mut(&mapping.code) {
            Some(existing) => {
                *existing = mapping.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_output_mapping(&self, code: &Code) -> Result<bool, StorageError> {
        let mut mappings = self.mappings.write().await;
        Ok(mappings.remove(code).is_some())
    }

    async fn get_output_mapping(&self, code: &Code) -> Result<Option<OutputMapping>, StorageError> {
        self.record_read();
        let mappings = self.mappings.read().await;
        Ok(mappings.get(code).cloned())
    }

    async fn list_output_mappings(&self) -> Result<Vec<OutputMapping>, StorageError> {
        self.record_read();
        let mappings = self.mappings.read().await;
        Ok(mappings.values().cloned().collect())
    }

    async fn get_user_tier(&self, username: &str) -> Result<Option<Tier>, StorageError> {
        self.record_read();
        let users = self.users.read().await;
        Ok(users.get(username).copied())
    }

    async fn add_user(&self, username: &str, tier: Tier) -> Result<(), StorageError> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(StorageError::AlreadyExists(username.to_string()));
        }
        users.insert(username.to_string(), tier);
        Ok(())
    }

    async fn update_user(&self, username: &str, tier: Tier) -> Result<bool, StorageError> {
        let mut users = self.users.write().await;
        match users.get_mut(username) {
            Some(existing) => {
                *existing = tier;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        let mut users = self.users.write().await;
        Ok(users.remove(username).is_some())
    }

    async fn list_users(&self) -> Result<Vec<(String, Tier)>, StorageError> {
        self.record_read();
        let users = self.users.read().await;
        Ok(users.iter().map(|(name, tier)| (name.clone(), *tier)).collect())
    }
}
