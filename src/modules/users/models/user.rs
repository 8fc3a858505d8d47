use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Entity, Result};

/// A user account document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime,
    #[serde(rename = "__v", default)]
    pub version: i64,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.into(),
            created_at: DateTime::now(),
            version: 0,
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn version(&self) -> i64 {
        self.version
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation(format!("Invalid email '{}'", email))),
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(())
}

/// Request body for POST /users
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

impl CreateUserRequest {
    pub fn into_user(self) -> Result<User> {
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        Ok(User::new(self.email.trim().to_lowercase(), self.name.trim()))
    }
}

/// Request body for PATCH /users/{id}
///
/// `version` is the version the client last read.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    pub version: i64,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl UpdateUserRequest {
    /// Fields to `$set`
    pub fn to_update(&self) -> Result<Document> {
        let mut fields = Document::new();

        if let Some(email) = &self.email {
            validate_email(email)?;
            fields.insert("email", email.trim().to_lowercase());
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
            fields.insert("name", name.trim());
        }

        if fields.is_empty() {
            return Err(AppError::validation("nothing to update"));
        }
        Ok(doc! { "$set": fields })
    }
}

/// JSON shape returned by the API
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
    pub version: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            name: user.name,
            created_at: user
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
            version: user.version,
        }
    }
}
