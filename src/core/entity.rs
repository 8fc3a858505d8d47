use mongodb::bson::oid::ObjectId;
use serde::{de::DeserializeOwned, Serialize};

/// A record type stored in a single collection.
///
/// The version field is bumped by every optimistic update and must
/// serialize under [`Entity::VERSION_KEY`].
pub trait Entity: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
    /// Collection the entity lives in
    const COLLECTION: &'static str;

    /// Document key of the version counter
    const VERSION_KEY: &'static str = "__v";

    /// `_id`, absent until the entity has been inserted
    fn id(&self) -> Option<ObjectId>;

    fn set_id(&mut self, id: ObjectId);

    fn version(&self) -> i64;
}
