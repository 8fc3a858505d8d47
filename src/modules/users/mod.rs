// Users module
//
// Sample entity showing how a collection specialises BaseRepository.

pub mod controllers;
pub mod models;
pub mod repositories;

pub use models::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
pub use repositories::UserRepository;
