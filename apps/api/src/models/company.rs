use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use validator::Validate;

use crate::errors::AppError;
use crate::models::like_pattern;
use crate::models::job::{self, JobSummary};
use crate::sql::{FieldSet, Table};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanySummary {
    pub handle: String,
    pub name: String,
}

/// A company together with the jobs it has posted.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewCompany {
    #[validate(length(min = 1))]
    pub handle: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CompanyPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
}

impl CompanyPatch {
    pub fn into_fields(self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields
            .insert_opt("name", self.name)
            .insert_opt("num_employees", self.num_employees)
            .insert_opt("description", self.description)
            .insert_opt("logo_url", self.logo_url);
        fields
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyFilter {
    pub search: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    pub fn check(&self) -> Result<(), AppError> {
        match (self.min_employees, self.max_employees) {
            (Some(min), Some(max)) if min > max => Err(AppError::Validation(
                "min_employees cannot exceed max_employees".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

pub async fn create(pool: &PgPool, new: &NewCompany) -> Result<Company, AppError> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (handle, name, num_employees, description, logo_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING handle, name, num_employees, description, logo_url
        "#,
    )
    .bind(&new.handle)
    .bind(&new.name)
    .bind(new.num_employees)
    .bind(&new.description)
    .bind(&new.logo_url)
    .fetch_one(pool)
    .await
    .map_err(AppError::from_write)?;

    info!("Created company {}", company.handle);
    Ok(company)
}

/// Lists companies matching every supplied filter, ordered by name.
pub async fn list(pool: &PgPool, filter: &CompanyFilter) -> Result<Vec<CompanySummary>, AppError> {
    filter.check()?;
    let mut qb = list_query(filter);
    Ok(qb.build_query_as::<CompanySummary>().fetch_all(pool).await?)
}

fn list_query(filter: &CompanyFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT handle, name FROM companies");
    let mut sep = " WHERE ";
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(sep)
            .push("(handle ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
        sep = " AND ";
    }
    if let Some(min) = filter.min_employees {
        qb.push(sep).push("num_employees >= ").push_bind(min);
        sep = " AND ";
    }
    if let Some(max) = filter.max_employees {
        qb.push(sep).push("num_employees <= ").push_bind(max);
    }
    qb.push(" ORDER BY name");
    qb
}

pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyDetail, AppError> {
    let company: Option<Company> = sqlx::query_as(
        "SELECT handle, name, num_employees, description, logo_url FROM companies WHERE handle = $1",
    )
    .bind(handle)
    .fetch_optional(pool)
    .await?;

    let company =
        company.ok_or_else(|| AppError::NotFound(format!("Company '{handle}' not found")))?;
    let jobs = job::list_for_company(pool, handle).await?;

    Ok(CompanyDetail { company, jobs })
}

/// Applies the non-empty fields of `patch`. Zero matched rows means the handle is unknown.
pub async fn update(pool: &PgPool, handle: &str, patch: CompanyPatch) -> Result<Company, AppError> {
    let statement = Table::Companies.partial_update(&patch.into_fields(), handle)?;

    let company = statement
        .query_as::<Company>()
        .fetch_optional(pool)
        .await
        .map_err(AppError::from_write)?
        .ok_or_else(|| AppError::NotFound(format!("Company '{handle}' not found")))?;

    info!("Updated company {handle}");
    Ok(company)
}

pub async fn delete(pool: &PgPool, handle: &str) -> Result<(), AppError> {
    let deleted: Option<String> =
        sqlx::query_scalar("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await?;

    deleted.ok_or_else(|| AppError::NotFound(format!("Company '{handle}' not found")))?;
    info!("Deleted company {handle}");
    Ok(())
}
