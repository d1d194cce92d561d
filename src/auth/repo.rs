use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, OtpCode, Profile, UniqueField, User, UserRow},
    db::{PgStore, StoreError, StoreResult},
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn exists_with(&self, field: UniqueField, value: &str) -> StoreResult<bool>;
    /// Fails with [`StoreError::Conflict`] naming the violated unique key.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    /// Replaces the pending code and expiry together.
    async fn set_otp(&self, id: Uuid, otp: &OtpCode) -> StoreResult<()>;
    /// Marks the email verified and clears the pending code in one write.
    async fn mark_email_verified(&self, id: Uuid) -> StoreResult<()>;
    async fn update_profile(&self, id: Uuid, profile: &Profile) -> StoreResult<Option<User>>;
}

const USER_COLUMNS: &str = r#"
    id, fullname, email, phone_number, password_hash, pan_card, aadhaar_card, role,
    bio, skills, resume, resume_original_name, profile_photo,
    is_email_verified, email_verification_otp, email_verification_expiry,
    created_at, updated_at
"#;

fn into_user(row: UserRow) -> StoreResult<User> {
    User::try_from(row).map_err(|e| StoreError::Backend(sqlx::Error::Decode(e.into())))
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_user).transpose()
    }

    async fn exists_with(&self, field: UniqueField, value: &str) -> StoreResult<bool> {
        // column name comes from a closed enum, never from input
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM users WHERE {} = $1)",
            field.column()
        ))
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (fullname, email, phone_number, password_hash, pan_card,
                               aadhaar_card, role, profile_photo, is_email_verified,
                               email_verification_otp, email_verification_expiry)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(&user.pan_card)
        .bind(&user.aadhaar_card)
        .bind(user.role.as_str())
        .bind(&user.profile_photo)
        .bind(&user.otp.code)
        .bind(user.otp.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        into_user(row)
    }

    async fn set_otp(&self, id: Uuid, otp: &OtpCode) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET email_verification_otp = $2,
                   email_verification_expiry = $3,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&otp.code)
        .bind(otp.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET is_email_verified = TRUE,
                   email_verification_otp = NULL,
                   email_verification_expiry = NULL,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: &Profile) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET bio = $2, skills = $3, resume = $4, resume_original_name = $5,
                   profile_photo = $6, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&profile.bio)
        .bind(&profile.skills)
        .bind(&profile.resume)
        .bind(&profile.resume_original_name)
        .bind(&profile.profile_photo)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_user).transpose()
    }
}
