use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{Code, OutputMapping, Tier};

/// Store trait - persistence for output mappings and user tiers.
///
/// Every call is atomic over a single row. Inserts never overwrite and
/// updates never insert.
#[async_trait]
pub trait Store: Send + Sync {
    // Output mapping operations
    async fn add_output_mapping(&self, mapping: &OutputMapping) -> Result<(), StorageError>;
    async fn update_output_mapping(&self, mapping: &OutputMapping) -> Result<bool, StorageError>;
    async fn delete_output_mapping(&self, code: &Code) -> Result<bool, StorageError>;
    async fn get_output_mapping(&self, code: &Code) -> Result<Option<OutputMapping>, StorageError>;
    async fn list_output_mappings(&self) -> Result<Vec<OutputMapping>, StorageError>;

    // User tier operations
    async fn get_user_tier(&self, username: &str) -> Result<Option<Tier>, StorageError>;
    async fn add_user(&self, username: &str, tier: Tier) -> Result<(), StorageError>;
    async fn update_user(&self, username: &str, tier: Tier) -> Result<bool, StorageError>;
    async fn delete_user(&self, username: &str) -> Result<bool, StorageError>;
    async fn list_users(&self) -> Result<Vec<(String, Tier)>, StorageError>;
}
