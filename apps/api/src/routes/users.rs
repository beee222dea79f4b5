use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, User, UserPatch, UserSummary};
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::validation::ValidatedJson;

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: User,
    pub token: String,
}

/// POST /users
///
/// Open registration. The response carries a token for the new account.
pub async fn handle_register(
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = user::create(&state.db, &new, state.bcrypt_cost).await?;
    let token = state.tokens.issue(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

/// GET /users
pub async fn handle_list_users(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = user::list(&state.db).await?;
    Ok(Json(UserListResponse { users }))
}

/// GET /users/:username
pub async fn handle_get_user(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user::get(&state.db, &username).await?;
    Ok(Json(UserResponse { user }))
}

/// PATCH /users/:username
pub async fn handle_update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(patch): ValidatedJson<UserPatch>,
) -> Result<Json<UserResponse>, AppError> {
    auth.ensure_is(&username)?;
    let user = user::update(&state.db, &username, patch, state.bcrypt_cost).await?;
    Ok(Json(UserResponse { user }))
}

/// DELETE /users/:username
pub async fn handle_delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    auth.ensure_is(&username)?;
    user::delete(&state.db, &username).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
