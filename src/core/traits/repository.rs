use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::core::Result;

/// Base repository trait for CRUD operations
/// HTTP handlers depend on this rather than on a concrete store
#[async_trait]
pub trait CrudRepository<T>: Send + Sync {
    /// Create a new entity, returning it with its generated id
    async fn create(&self, entity: T) -> Result<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>>;

    /// Apply `update` only if the stored version equals `expected_version`
    async fn update_by_id(&self, id: ObjectId, update: Document, expected_version: i64)
        -> Result<T>;

    /// Delete an entity by ID, returning whether anything was removed
    async fn delete_by_id(&self, id: ObjectId) -> Result<bool>;

    /// List all entities (with optional pagination)
    async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<T>>;
}
