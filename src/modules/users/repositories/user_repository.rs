// Repository for user documents
//
// Adds email lookups and a unique email index on top of BaseRepository.

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, IndexModel};
use serde::{Deserialize, Serialize};

use crate::core::{CrudRepository, Result};
use crate::modules::users::models::User;
use crate::repository::{BaseRepository, RepositoryOptions};

/// Number of users per email domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCount {
    #[serde(rename = "_id")]
    pub domain: String,
    pub count: i64,
}

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository<User>,
}

impl UserRepository {
    pub fn new(client: Client, database: &str, options: RepositoryOptions) -> Self {
        Self {
            base: BaseRepository::new(client, database, options),
        }
    }

    /// Generic operations shared with every other collection
    pub fn base(&self) -> &BaseRepository<User> {
        &self.base
    }

    /// Create the unique index on `email`
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.base.collection().create_index(index, None).await?;
        tracing::info!(collection = "users", "Indexes ensured");
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.base
            .find_one(doc! { "email": email.trim().to_lowercase() }, None)
            .await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.base
            .exists(doc! { "email": email.trim().to_lowercase() }, None)
            .await
    }

    /// Users grouped by the domain part of their email, largest first
    pub async fn count_by_domain(&self) -> Result<Vec<DomainCount>> {
        let pipeline = vec![
            doc! {
                "$group": {
                    "_id": { "$arrayElemAt": [{ "$split": ["$email", "@"] }, 1] },
                    "count": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "count": -1, "_id": 1 } },
        ];

        self.base.aggregate_as(pipeline, None).await
    }
}

#[async_trait]
impl CrudRepository<User> for UserRepository {
    async fn create(&self, user: User) -> Result<User> {
        self.base.create(user, None).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        self.base.find_by_id(id, None).await
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        update: Document,
        expected_version: i64,
    ) -> Result<User> {
        self.base.update_by_id(id, update, expected_version).await
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool> {
        self.base.delete_by_id(id, None).await
    }

    async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<User>> {
        CrudRepository::list(&self.base, limit, offset).await
    }
}
