// Generic MongoDB repository
//
// Each entity repository wraps a BaseRepository<T> and adds its own finders.
// Every operation takes an optional session so callers can group several
// calls into one transaction. Driver failures are translated through the
// error code table and, when enabled, logged with the collection name.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::options::{CountOptions, FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Client, ClientSession, Collection};
use serde::de::DeserializeOwned;

use super::query::{page_bounds, FindQuery, Page};
use super::versioning::{normalize_update, version_filter, versioned_update};
use crate::core::{AppError, CrudRepository, Entity, Result};

/// Behaviour switches shared by every repository
#[derive(Debug, Clone, Copy)]
pub struct RepositoryOptions {
    /// Log translated driver failures at error level
    pub log_errors: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self { log_errors: true }
    }
}

/// CRUD, aggregation and transaction helpers over one collection
pub struct BaseRepository<T: Entity> {
    client: Client,
    collection: Collection<T>,
    options: RepositoryOptions,
}

impl<T: Entity> Clone for BaseRepository<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            collection: self.collection.clone(),
            options: self.options,
        }
    }
}

impl<T: Entity> BaseRepository<T> {
    /// Bind to `T::COLLECTION` in `database`
    pub fn new(client: Client, database: &str, options: RepositoryOptions) -> Self {
        let collection = client.database(database).collection::<T>(T::COLLECTION);
        Self {
            client,
            collection,
            options,
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    fn fail(&self, operation: &'static str, err: mongodb::error::Error) -> AppError {
        let err = AppError::from(err);
        if self.options.log_errors {
            tracing::error!(
                collection = T::COLLECTION,
                operation,
                code = ?err.driver_code(),
                error = %err,
                "Repository operation failed"
            );
        }
        err
    }

    fn not_found(id: &ObjectId) -> AppError {
        AppError::not_found(format!("{} {}", T::COLLECTION, id))
    }

    // ---- reads -------------------------------------------------------

    /// Find all documents matching the query
    pub async fn find(
        &self,
        query: impl Into<FindQuery>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<T>> {
        let (filter, options) = query.into().into_parts();

        let result: mongodb::error::Result<Vec<T>> = async {
            match session {
                Some(session) => {
                    let mut cursor = self
                        .collection
                        .find_with_session(filter, options, &mut *session)
                        .await?;
                    cursor.stream(session).try_collect().await
                }
                None => self.collection.find(filter, options).await?.try_collect().await,
            }
        }
        .await;

        result.map_err(|e| self.fail("find", e))
    }

    /// Like `find`, but returns raw documents so projections can drop fields
    pub async fn find_documents(
        &self,
        query: impl Into<FindQuery>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<Document>> {
        let (filter, options) = query.into().into_parts();
        let raw = self.collection.clone_with_type::<Document>();

        let result: mongodb::error::Result<Vec<Document>> = async {
            match session {
                Some(session) => {
                    let mut cursor = raw.find_with_session(filter, options, &mut *session).await?;
                    cursor.stream(session).try_collect().await
                }
                None => raw.find(filter, options).await?.try_collect().await,
            }
        }
        .await;

        result.map_err(|e| self.fail("find_documents", e))
    }

    pub async fn find_one(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<Option<T>> {
        let result = match session {
            Some(session) => {
                self.collection
                    .find_one_with_session(filter, None, session)
                    .await
            }
            None => self.collection.find_one(filter, None).await,
        };

        result.map_err(|e| self.fail("find_one", e))
    }

    pub async fn find_by_id(
        &self,
        id: ObjectId,
        session: Option<&mut ClientSession>,
    ) -> Result<Option<T>> {
        self.find_one(doc! { "_id": id }, session).await
    }

    /// Count documents matching `filter`
    pub async fn count(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<u64> {
        self.count_with(filter, None, session)
            .await
            .map_err(|e| self.fail("count", e))
    }

    /// True when at least one document matches `filter`
    pub async fn exists(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<bool> {
        let mut options = CountOptions::default();
        options.limit = Some(1);

        let count = self
            .count_with(filter, Some(options), session)
            .await
            .map_err(|e| self.fail("exists", e))?;
        Ok(count > 0)
    }

    async fn count_with(
        &self,
        filter: Document,
        options: Option<CountOptions>,
        session: Option<&mut ClientSession>,
    ) -> mongodb::error::Result<u64> {
        match session {
            Some(session) => {
                self.collection
                    .count_documents_with_session(filter, options, session)
                    .await
            }
            None => self.collection.count_documents(filter, options).await,
        }
    }

    /// Fetch one 1-based page plus the total match count
    pub async fn paginate(
        &self,
        filter: Document,
        sort: Option<Document>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<T>> {
        let (skip, limit) = page_bounds(page, per_page)?;

        let mut query = FindQuery::new(filter.clone()).skip(skip).limit(limit);
        query.sort = sort;

        let items = self.find(query, None).await?;
        let total = self.count(filter, None).await?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    // ---- writes ------------------------------------------------------

    /// Insert `entity`, returning it with the generated `_id`
    pub async fn create(&self, mut entity: T, session: Option<&mut ClientSession>) -> Result<T> {
        let result = match session {
            Some(session) => {
                self.collection
                    .insert_one_with_session(&entity, None, session)
                    .await
            }
            None => self.collection.insert_one(&entity, None).await,
        };
        let inserted = result.map_err(|e| self.fail("create", e))?;

        if let Some(id) = inserted.inserted_id.as_object_id() {
            entity.set_id(id);
        }
        tracing::debug!(collection = T::COLLECTION, id = %inserted.inserted_id, "Document created");

        Ok(entity)
    }

    pub async fn create_many(
        &self,
        mut entities: Vec<T>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<T>> {
        if entities.is_empty() {
            return Ok(entities);
        }

        let result = match session {
            Some(session) => {
                self.collection
                    .insert_many_with_session(entities.iter(), None, session)
                    .await
            }
            None => self.collection.insert_many(entities.iter(), None).await,
        };
        let inserted = result.map_err(|e| self.fail("create_many", e))?;

        for (index, id) in inserted.inserted_ids {
            if let (Some(entity), Some(id)) = (entities.get_mut(index), id.as_object_id()) {
                entity.set_id(id);
            }
        }

        Ok(entities)
    }

    /// Update the first match and return it as it is after the update
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<Option<T>> {
        let update = normalize_update(update)?;
        self.find_one_and_update(filter, update, false, session)
            .await
            .map_err(|e| self.fail("update_one", e))
    }

    /// Update every match, returning the number of modified documents
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<u64> {
        let update = normalize_update(update)?;
        let result = match session {
            Some(session) => {
                self.collection
                    .update_many_with_session(filter, update, None, session)
                    .await
            }
            None => self.collection.update_many(filter, update, None).await,
        };

        result
            .map(|r| r.modified_count)
            .map_err(|e| self.fail("update_many", e))
    }

    /// Update the first match, inserting it when nothing matches
    pub async fn upsert(
        &self,
        filter: Document,
        update: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<T> {
        let update = normalize_update(update)?;
        self.find_one_and_update(filter, update, true, session)
            .await
            .map_err(|e| self.fail("upsert", e))?
            .ok_or_else(|| {
                AppError::internal(format!("upsert into {} returned nothing", T::COLLECTION))
            })
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
        session: Option<&mut ClientSession>,
    ) -> mongodb::error::Result<Option<T>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::After);
        if upsert {
            options.upsert = Some(true);
        }

        match session {
            Some(session) => {
                self.collection
                    .find_one_and_update_with_session(filter, update, options, session)
                    .await
            }
            None => {
                self.collection
                    .find_one_and_update(filter, update, options)
                    .await
            }
        }
    }

    /// Optimistic update by id.
    ///
    /// Runs in its own transaction: the stored version must equal
    /// `expected_version`, and the update bumps it by one. A missing
    /// document is `NotFound`, a stale version is `Conflict`. Any failure
    /// aborts the transaction; the session is always ended.
    pub async fn update_by_id(
        &self,
        id: ObjectId,
        update: Document,
        expected_version: i64,
    ) -> Result<T> {
        let update = versioned_update(update, T::VERSION_KEY)?;

        let mut session = self.start_session().await?;
        self.start_transaction(&mut session).await?;

        let outcome = match self
            .apply_versioned_update(&mut session, id, update, expected_version)
            .await
        {
            Ok(updated) => self
                .commit_transaction(&mut session)
                .await
                .map(|_| updated),
            Err(err) => {
                if let Err(abort_err) = self.abort_transaction(&mut session).await {
                    tracing::warn!(
                        collection = T::COLLECTION,
                        %id,
                        error = %abort_err,
                        "Failed to abort transaction"
                    );
                }
                Err(err)
            }
        };

        self.end_session(session);
        outcome
    }

    async fn apply_versioned_update(
        &self,
        session: &mut ClientSession,
        id: ObjectId,
        update: Document,
        expected_version: i64,
    ) -> Result<T> {
        let current = self
            .find_by_id(id, Some(&mut *session))
            .await?
            .ok_or_else(|| Self::not_found(&id))?;

        if current.version() != expected_version {
            return Err(AppError::conflict(format!(
                "{} {} is at version {}, expected {}",
                T::COLLECTION,
                id,
                current.version(),
                expected_version
            )));
        }

        let filter = version_filter(&Bson::ObjectId(id), T::VERSION_KEY, expected_version);
        let updated = self
            .update_one(filter, update, Some(&mut *session))
            .await?
            .ok_or_else(|| {
                AppError::conflict(format!("{} {} changed during update", T::COLLECTION, id))
            })?;

        tracing::debug!(
            collection = T::COLLECTION,
            %id,
            version = updated.version(),
            "Document updated"
        );
        Ok(updated)
    }

    /// Delete the first match
    pub async fn delete_one(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<bool> {
        let result = match session {
            Some(session) => {
                self.collection
                    .delete_one_with_session(filter, None, session)
                    .await
            }
            None => self.collection.delete_one(filter, None).await,
        };

        result
            .map(|r| r.deleted_count > 0)
            .map_err(|e| self.fail("delete_one", e))
    }

    /// Delete every match, returning how many were removed
    pub async fn delete_many(
        &self,
        filter: Document,
        session: Option<&mut ClientSession>,
    ) -> Result<u64> {
        let result = match session {
            Some(session) => {
                self.collection
                    .delete_many_with_session(filter, None, session)
                    .await
            }
            None => self.collection.delete_many(filter, None).await,
        };

        result
            .map(|r| r.deleted_count)
            .map_err(|e| self.fail("delete_many", e))
    }

    pub async fn delete_by_id(
        &self,
        id: ObjectId,
        session: Option<&mut ClientSession>,
    ) -> Result<bool> {
        self.delete_one(doc! { "_id": id }, session).await
    }

    // ---- aggregation -------------------------------------------------

    /// Run an aggregation pipeline and collect the output documents
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<Document>> {
        let result: mongodb::error::Result<Vec<Document>> = async {
            match session {
                Some(session) => {
                    let mut cursor = self
                        .collection
                        .aggregate_with_session(pipeline, None, &mut *session)
                        .await?;
                    cursor.stream(session).try_collect().await
                }
                None => self.collection.aggregate(pipeline, None).await?.try_collect().await,
            }
        }
        .await;

        result.map_err(|e| self.fail("aggregate", e))
    }

    /// Run an aggregation pipeline and decode each output document as `R`
    pub async fn aggregate_as<R: DeserializeOwned>(
        &self,
        pipeline: Vec<Document>,
        session: Option<&mut ClientSession>,
    ) -> Result<Vec<R>> {
        self.aggregate(pipeline, session)
            .await?
            .into_iter()
            .map(|document| bson::from_document(document).map_err(AppError::from))
            .collect()
    }

    // ---- sessions and transactions -----------------------------------

    pub async fn start_session(&self) -> Result<ClientSession> {
        self.client
            .start_session(None)
            .await
            .map_err(|e| self.fail("start_session", e))
    }

    pub async fn start_transaction(&self, session: &mut ClientSession) -> Result<()> {
        session
            .start_transaction(None)
            .await
            .map_err(|e| self.fail("start_transaction", e))
    }

    pub async fn commit_transaction(&self, session: &mut ClientSession) -> Result<()> {
        session
            .commit_transaction()
            .await
            .map_err(|e| self.fail("commit_transaction", e))
    }

    pub async fn abort_transaction(&self, session: &mut ClientSession) -> Result<()> {
        session
            .abort_transaction()
            .await
            .map_err(|e| self.fail("abort_transaction", e))
    }

    /// End the session. An in-progress transaction is aborted by the driver.
    pub fn end_session(&self, session: ClientSession) {
        tracing::trace!(collection = T::COLLECTION, "Session ended");
        drop(session);
    }
}

#[async_trait]
impl<T: Entity> CrudRepository<T> for BaseRepository<T> {
    async fn create(&self, entity: T) -> Result<T> {
        BaseRepository::create(self, entity, None).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>> {
        BaseRepository::find_by_id(self, id, None).await
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        update: Document,
        expected_version: i64,
    ) -> Result<T> {
        BaseRepository::update_by_id(self, id, update, expected_version).await
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool> {
        BaseRepository::delete_by_id(self, id, None).await
    }

    async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<T>> {
        let mut query = FindQuery::new(Document::new()).sort(doc! { "_id": 1 });
        // the driver reads a zero limit as "no limit"; keep that explicit
        if let Some(limit) = limit.filter(|l| *l > 0) {
            query = query.limit(i64::from(limit));
        }
        if let Some(offset) = offset {
            query = query.skip(u64::from(offset));
        }
        self.find(query, None).await
    }
}
