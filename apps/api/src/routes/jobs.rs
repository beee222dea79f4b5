use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::errors::AppError;
use crate::models::job::{self, Job, JobFilter, JobPatch, JobSummary, NewJob};
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::validation::{QueryParams, ValidatedJson};

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub job: Job,
}

/// GET /jobs?search=&min_salary=&min_equity=
pub async fn handle_list_jobs(
    _user: AuthUser,
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<JobFilter>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = job::list(&state.db, &filter).await?;
    Ok(Json(JobListResponse { jobs }))
}

/// POST /jobs
pub async fn handle_create_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewJob>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    let job = job::create(&state.db, &new).await?;
    info!("Job {} created by admin {}", job.id, admin.username);
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

/// GET /jobs/:id
pub async fn handle_get_job(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = job::get(&state.db, job::parse_id(&id)?).await?;
    Ok(Json(JobResponse { job }))
}

/// PATCH /jobs/:id
pub async fn handle_update_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<JobPatch>,
) -> Result<Json<JobResponse>, AppError> {
    let job = job::update(&state.db, job::parse_id(&id)?, patch).await?;
    info!("Job {} updated by admin {}", job.id, admin.username);
    Ok(Json(JobResponse { job }))
}

/// DELETE /jobs/:id
pub async fn handle_delete_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    job::delete(&state.db, job::parse_id(&id)?).await?;
    info!("Job {id} deleted by admin {}", admin.username);
    Ok(Json(MessageResponse::new("Job deleted")))
}
