use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use validator::Validate;

use crate::errors::AppError;
use crate::models::like_pattern;
use crate::sql::{FieldSet, Table};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: f64,
    pub equity: f64,
    pub company_handle: String,
    pub date_posted: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobSummary {
    pub id: i32,
    pub title: String,
    pub company_handle: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewJob {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(range(min = 0.0))]
    pub salary: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub equity: f64,
    #[validate(length(min = 1))]
    pub company_handle: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct JobPatch {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(range(min = 0.0))]
    pub salary: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub equity: Option<f64>,
    #[validate(length(min = 1))]
    pub company_handle: Option<String>,
}

impl JobPatch {
    pub fn into_fields(self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields
            .insert_opt("title", self.title)
            .insert_opt("salary", self.salary)
            .insert_opt("equity", self.equity)
            .insert_opt("company_handle", self.company_handle);
        fields
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct JobFilter {
    pub search: Option<String>,
    pub min_salary: Option<f64>,
    pub min_equity: Option<f64>,
}

/// Job ids arrive as path text; anything that is not an id cannot name a job.
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .map_err(|_| AppError::NotFound(format!("Job '{raw}' not found")))
}

pub async fn create(pool: &PgPool, new: &NewJob) -> Result<Job, AppError> {
    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (title, salary, equity, company_handle)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, salary, equity, company_handle, date_posted
        "#,
    )
    .bind(&new.title)
    .bind(new.salary)
    .bind(new.equity)
    .bind(&new.company_handle)
    .fetch_one(pool)
    .await
    .map_err(AppError::from_write)?;

    info!("Created job {} for company {}", job.id, job.company_handle);
    Ok(job)
}

/// Lists jobs matching every supplied filter, newest first.
pub async fn list(pool: &PgPool, filter: &JobFilter) -> Result<Vec<JobSummary>, AppError> {
    let mut qb = list_query(filter);
    Ok(qb.build_query_as::<JobSummary>().fetch_all(pool).await?)
}

fn list_query(filter: &JobFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT id, title, company_handle FROM jobs");
    let mut sep = " WHERE ";
    if let Some(search) = &filter.search {
        qb.push(sep)
            .push("title ILIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\'");
        sep = " AND ";
    }
    if let Some(min) = filter.min_salary {
        qb.push(sep).push("salary >= ").push_bind(min);
        sep = " AND ";
    }
    if let Some(min) = filter.min_equity {
        qb.push(sep).push("equity >= ").push_bind(min);
    }
    qb.push(" ORDER BY date_posted DESC");
    qb
}

pub async fn list_for_company(pool: &PgPool, handle: &str) -> Result<Vec<JobSummary>, AppError> {
    Ok(sqlx::query_as::<_, JobSummary>(
        "SELECT id, title, company_handle FROM jobs WHERE company_handle = $1 ORDER BY date_posted DESC",
    )
    .bind(handle)
    .fetch_all(pool)
    .await?)
}

pub async fn get(pool: &PgPool, id: i32) -> Result<Job, AppError> {
    let job: Option<Job> = sqlx::query_as(
        "SELECT id, title, salary, equity, company_handle, date_posted FROM jobs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    job.ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

pub async fn update(pool: &PgPool, id: i32, patch: JobPatch) -> Result<Job, AppError> {
    let statement = Table::Jobs.partial_update(&patch.into_fields(), id)?;

    let job = statement
        .query_as::<Job>()
        .fetch_optional(pool)
        .await
        .map_err(AppError::from_write)?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    info!("Updated job {id}");
    Ok(job)
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
    let deleted: Option<i32> = sqlx::query_scalar("DELETE FROM jobs WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    deleted.ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    info!("Deleted job {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::partial_update::SqlValue;

    #[test]
    fn test_list_query_escapes_search() {
        let filter = JobFilter {
            search: Some("100%_remote".to_string()),
            min_equity: Some(0.1),
            ..Default::default()
        };
        assert_eq!(
            list_query(&filter).sql(),
            "SELECT id, title, company_handle FROM jobs WHERE title ILIKE $1 ESCAPE '\\' \
             AND equity >= $2 ORDER BY date_posted DESC"
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("BADHANDLE"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id(""), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_patch_binds_floats() {
        let patch = JobPatch {
            salary: Some(99.99),
            equity: Some(0.33),
            ..Default::default()
        };
        let statement = Table::Jobs.partial_update(&patch.into_fields(), 1).unwrap();
        assert_eq!(
            statement.query,
            "UPDATE jobs SET salary=$1, equity=$2 WHERE id=$3 RETURNING *"
        );
        assert_eq!(
            statement.values,
            vec![SqlValue::Float(99.99), SqlValue::Float(0.33), SqlValue::Int(1)]
        );
    }

    #[test]
    fn test_equity_bounds() {
        let job = NewJob {
            title: "banana manager".to_string(),
            salary: 33.33,
            equity: 1.5,
            company_handle: "banana".to_string(),
        };
        assert!(job.validate().is_err());

        let job = NewJob { equity: 0.75, ..job };
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_patch_rejects_negative_salary() {
        let patch = JobPatch {
            salary: Some(-1.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
