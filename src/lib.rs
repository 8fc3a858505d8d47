//! Generic CRUD repository over MongoDB
//!
//! `BaseRepository<T>` forwards to the official driver and translates driver
//! error codes into HTTP statuses. Entity repositories wrap it and add their
//! own finders; see the `users` module for a complete example.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod repository;

// Re-export commonly used types
pub use crate::core::{AppError, CrudRepository, Entity, Result};
pub use modules::users;
pub use repository::{BaseRepository, FindQuery, Page, RepositoryOptions};
