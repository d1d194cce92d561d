use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{PgStore, StoreError, StoreResult};

/// No transition table: any status may be written over any other.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive.
impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    #[serde(rename = "job")]
    pub job_id: Uuid,
    #[serde(rename = "applicant")]
    pub applicant_id: Uuid,
    pub status: ApplicationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    applicant_id: Uuid,
    status: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(r: ApplicationRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<ApplicationStatus>().map_err(|_| {
            StoreError::Backend(sqlx::Error::Decode(
                format!("unknown application status {:?} for {}", r.status, r.id).into(),
            ))
        })?;
        Ok(Self {
            id: r.id,
            job_id: r.job_id,
            applicant_id: r.applicant_id,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Application>>;
    async fn find_for(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Option<Application>>;
    /// Creates a pending application. A second one for the same pair fails
    /// with [`StoreError::Conflict`].
    async fn insert(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Application>;
    /// Newest first.
    async fn list_by_applicant(&self, applicant_id: Uuid) -> StoreResult<Vec<Application>>;
    /// The job's application list. Newest first.
    async fn list_by_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>>;
    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> StoreResult<Option<Application>>;
}

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, status, created_at, updated_at";

fn collect(rows: Vec<ApplicationRow>) -> StoreResult<Vec<Application>> {
    rows.into_iter().map(Application::try_from).collect()
}

#[async_trait]
impl ApplicationRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn find_for(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 AND applicant_id = $2"
        ))
        .bind(job_id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn insert(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications (job_id, applicant_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        row.try_into()
    }

    async fn list_by_applicant(&self, applicant_id: Uuid) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE applicant_id = $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn list_by_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE job_id = $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
               SET status = $2, updated_at = now()
             WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }
}
