use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{AppError, CrudRepository};
use crate::modules::users::models::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
use crate::repository::parse_object_id;

/// Query parameters for listing users
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

const MAX_LIMIT: u32 = 200;

fn default_limit() -> u32 {
    50
}

impl ListUsersQuery {
    /// Page size within `1..=MAX_LIMIT`; a zero limit would mean "everything" to the driver
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// Create a new user
/// POST /users
pub async fn create_user<R: CrudRepository<User>>(
    repository: web::Data<R>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = request.into_inner().into_user()?;
    let user = repository.create(user).await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Get user by ID
/// GET /users/{id}
pub async fn get_user<R: CrudRepository<User>>(
    repository: web::Data<R>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path.into_inner())?;
    let user = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("users {}", id)))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// List users
/// GET /users
pub async fn list_users<R: CrudRepository<User>>(
    repository: web::Data<R>,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, AppError> {
    let users = repository
        .list(Some(query.effective_limit()), Some(query.offset))
        .await?;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Update a user if the caller's version is still current
/// PATCH /users/{id}
pub async fn update_user<R: CrudRepository<User>>(
    repository: web::Data<R>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path.into_inner())?;
    let update = request.to_update()?;
    let user = repository.update_by_id(id, update, request.version).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete a user
/// DELETE /users/{id}
pub async fn delete_user<R: CrudRepository<User>>(
    repository: web::Data<R>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path.into_inner())?;
    if !repository.delete_by_id(id).await? {
        return Err(AppError::not_found(format!("users {}", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Configure user routes against any repository implementation
pub fn configure<R: CrudRepository<User> + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::post().to(create_user::<R>))
            .route("", web::get().to(list_users::<R>))
            .route("/{id}", web::get().to(get_user::<R>))
            .route("/{id}", web::patch().to(update_user::<R>))
            .route("/{id}", web::delete().to(delete_user::<R>)),
    );
}
