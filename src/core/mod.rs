pub mod entity;
pub mod error;
pub mod error_codes;
pub mod traits;

pub use entity::Entity;
pub use error::{AppError, DatabaseError, Result};
pub use traits::CrudRepository;
