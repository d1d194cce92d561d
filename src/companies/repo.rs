use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{PgStore, StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<String>,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Company fields embedded in job listings.
#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<String>,
}

impl From<Company> for CompanySummary {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            website: c.website,
            location: c.location,
            logo: c.logo,
        }
    }
}

#[async_trait]
pub trait CompanyRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>>;
    /// Case-insensitive; `except` skips the company being renamed.
    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> StoreResult<bool>;
    async fn count_owned_by(&self, user_id: Uuid) -> StoreResult<i64>;
    /// Newest first.
    async fn list_all(&self) -> StoreResult<Vec<Company>>;
    async fn insert(&self, name: &str, user_id: Uuid) -> StoreResult<Company>;
    /// Writes every mutable column of `company`.
    async fn update(&self, company: &Company) -> StoreResult<Option<Company>>;
}

const COMPANY_COLUMNS: &str =
    "id, name, description, website, location, logo, user_id, created_at, updated_at";

#[async_trait]
impl CompanyRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM companies
                 WHERE lower(name) = lower($1)
                   AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_owned_by(&self, user_id: Uuid) -> StoreResult<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn list_all(&self) -> StoreResult<Vec<Company>> {
        let rows = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, name: &str, user_id: Uuid) -> StoreResult<Company> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (name, user_id) VALUES ($1, $2) RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        Ok(row)
    }

    async fn update(&self, company: &Company) -> StoreResult<Option<Company>> {
        let row = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
               SET name = $2, description = $3, website = $4, location = $5, logo = $6,
                   updated_at = now()
             WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.location)
        .bind(&company.logo)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        Ok(row)
    }
}
