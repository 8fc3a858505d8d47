pub mod base;
pub mod query;
pub mod versioning;

pub use base::{BaseRepository, RepositoryOptions};
pub use query::{parse_object_id, FindQuery, Page};
pub use versioning::{normalize_update, versioned_update};
