use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::errors::AppError;
use crate::models::company::{
    self, Company, CompanyDetail, CompanyFilter, CompanyPatch, CompanySummary, NewCompany,
};
use crate::routes::MessageResponse;
use crate::state::AppState;
use crate::validation::{QueryParams, ValidatedJson};

#[derive(Serialize)]
pub struct CompanyListResponse {
    pub companies: Vec<CompanySummary>,
}

#[derive(Serialize)]
pub struct CompanyResponse {
    pub company: Company,
}

#[derive(Serialize)]
pub struct CompanyDetailResponse {
    pub company: CompanyDetail,
}

/// GET /companies?search=&min_employees=&max_employees=
pub async fn handle_list_companies(
    _user: AuthUser,
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CompanyFilter>,
) -> Result<Json<CompanyListResponse>, AppError> {
    let companies = company::list(&state.db, &filter).await?;
    Ok(Json(CompanyListResponse { companies }))
}

/// POST /companies
pub async fn handle_create_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewCompany>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let company = company::create(&state.db, &new).await?;
    info!("Company {} created by admin {}", company.handle, admin.username);
    Ok((StatusCode::CREATED, Json(CompanyResponse { company })))
}

/// GET /companies/:handle
pub async fn handle_get_company(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<CompanyDetailResponse>, AppError> {
    let company = company::get(&state.db, &handle).await?;
    Ok(Json(CompanyDetailResponse { company }))
}

/// PATCH /companies/:handle
pub async fn handle_update_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(handle): Path<String>,
    ValidatedJson(patch): ValidatedJson<CompanyPatch>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = company::update(&state.db, &handle, patch).await?;
    info!("Company {handle} updated by admin {}", admin.username);
    Ok(Json(CompanyResponse { company }))
}

/// DELETE /companies/:handle
pub async fn handle_delete_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    company::delete(&state.db, &handle).await?;
    info!("Company {handle} deleted by admin {}", admin.username);
    Ok(Json(MessageResponse::new("Company deleted")))
}
