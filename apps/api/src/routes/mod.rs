pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

use axum::{routing::get, Router};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Companies
        .route(
            "/companies",
            get(companies::handle_list_companies).post(companies::handle_create_company),
        )
        .route(
            "/companies/:handle",
            get(companies::handle_get_company)
                .patch(companies::handle_update_company)
                .delete(companies::handle_delete_company),
        )
        // Jobs
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Users
        .route(
            "/users",
            get(users::handle_list_users).post(users::handle_register),
        )
        .route(
            "/users/:username",
            get(users::handle_get_user)
                .patch(users::handle_update_user)
                .delete(users::handle_delete_user),
        )
        .fallback(not_found)
        .with_state(state)
}
