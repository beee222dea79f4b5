use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use validator::Validate;

use crate::auth::password;
use crate::errors::AppError;
use crate::sql::{FieldSet, Table};
use crate::validation::{blank_as_none, blank_as_null};

/// Public view of a user row. The password column is never read into it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url)]
    pub photo_url: Option<String>,
    /// Accepted for client compatibility but never stored. Only `true` is refused.
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl NewUser {
    /// Registration cannot grant admin.
    pub fn check(&self) -> Result<(), AppError> {
        if self.is_admin == Some(true) {
            return Err(AppError::Validation(
                "is_admin cannot be set at registration".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Null or blank clears the photo.
    #[serde(default, deserialize_with = "blank_as_null")]
    #[validate(url)]
    pub photo_url: Option<Option<String>>,
}

impl UserPatch {
    /// Replaces a plaintext password with its bcrypt hash.
    pub async fn hash_password(mut self, cost: u32) -> Result<Self, AppError> {
        if let Some(plain) = self.password.take() {
            self.password = Some(password::hash(plain, cost).await?);
        }
        Ok(self)
    }

    pub fn into_fields(self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields
            .insert_opt("password", self.password)
            .insert_opt("first_name", self.first_name)
            .insert_opt("last_name", self.last_name)
            .insert_opt("email", self.email)
            .insert_opt("photo_url", self.photo_url);
        fields
    }
}

/// Registers a regular (non-admin) user. Duplicate username or email is a conflict.
pub async fn create(pool: &PgPool, new: &NewUser, bcrypt_cost: u32) -> Result<User, AppError> {
    new.check()?;
    let hashed = password::hash(new.password.clone(), bcrypt_cost).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password, first_name, last_name, email, photo_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING username, first_name, last_name, email, photo_url, is_admin
        "#,
    )
    .bind(&new.username)
    .bind(&hashed)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.photo_url)
    .fetch_one(pool)
    .await
    .map_err(AppError::from_write)?;

    info!("Registered user {}", user.username);
    Ok(user)
}

pub async fn list(pool: &PgPool) -> Result<Vec<UserSummary>, AppError> {
    Ok(sqlx::query_as::<_, UserSummary>(
        "SELECT username, first_name, last_name, email FROM users ORDER BY username",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn get(pool: &PgPool, username: &str) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as(
        "SELECT username, first_name, last_name, email, photo_url, is_admin FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))
}

pub async fn update(
    pool: &PgPool,
    username: &str,
    patch: UserPatch,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    let fields = patch.hash_password(bcrypt_cost).await?.into_fields();
    let statement = Table::Users.partial_update(&fields, username)?;

    // RETURNING * includes the password; `User` does not map it.
    let user = statement
        .query_as::<User>()
        .fetch_optional(pool)
        .await
        .map_err(AppError::from_write)?
        .ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))?;

    info!("Updated user {username}");
    Ok(user)
}

pub async fn delete(pool: &PgPool, username: &str) -> Result<(), AppError> {
    let deleted: Option<String> =
        sqlx::query_scalar("DELETE FROM users WHERE username = $1 RETURNING username")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    deleted.ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))?;
    info!("Deleted user {username}");
    Ok(())
}
