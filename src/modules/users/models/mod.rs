mod user;

pub use user::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
