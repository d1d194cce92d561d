use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{PgStore, StoreResult};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: String,
    pub experience_level: i32,
    pub location: String,
    pub job_type: String,
    pub position: i32,
    pub company_id: Uuid,
    #[serde(rename = "created_by")]
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated job fields, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: String,
    pub experience_level: i32,
    pub location: String,
    pub job_type: String,
    pub position: i32,
    pub company_id: Uuid,
}

#[async_trait]
pub trait JobRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>>;
    /// Newest first.
    async fn list_all(&self) -> StoreResult<Vec<Job>>;
    /// Newest first.
    async fn list_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Job>>;
    async fn insert(&self, draft: &JobDraft, created_by: Uuid) -> StoreResult<Job>;
    async fn update(&self, id: Uuid, draft: &JobDraft) -> StoreResult<Option<Job>>;
}

const JOB_COLUMNS: &str = r#"
    id, title, description, requirements, salary, experience_level, location,
    job_type, position, company_id, created_by, created_at, updated_at
"#;

#[async_trait]
impl JobRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_all(&self) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, draft: &JobDraft, created_by: Uuid) -> StoreResult<Job> {
        let row = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, description, requirements, salary, experience_level,
                              location, job_type, position, company_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.requirements)
        .bind(&draft.salary)
        .bind(draft.experience_level)
        .bind(&draft.location)
        .bind(&draft.job_type)
        .bind(draft.position)
        .bind(draft.company_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, draft: &JobDraft) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
               SET title = $2, description = $3, requirements = $4, salary = $5,
                   experience_level = $6, location = $7, job_type = $8, position = $9,
                   company_id = $10, updated_at = now()
             WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.requirements)
        .bind(&draft.salary)
        .bind(draft.experience_level)
        .bind(&draft.location)
        .bind(&draft.job_type)
        .bind(draft.position)
        .bind(draft.company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
