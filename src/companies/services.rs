use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    api::required,
    auth::{jwt::AuthUser, repo_types::Role},
    companies::{dto::CompanyChanges, repo::Company},
    db::StoreError,
    error::{AppResult, AuthorizationError, ConflictError, NotFoundError},
    state::AppState,
    uploads::{check_upload, store_upload, UploadKind},
};

pub const MAX_COMPANIES_PER_USER: i64 = 10;

#[instrument(skip(st))]
pub async fn register(st: &AppState, caller: AuthUser, company_name: Option<&str>) -> AppResult<Company> {
    if caller.role != Role::Recruiter {
        warn!(user_id = %caller.id, role = %caller.role, "non-recruiter tried to register a company");
        return Err(AuthorizationError::RoleNotAllowed("Only recruiters can register companies").into());
    }
    let name = required(company_name, "companyName")?;

    if st.companies.name_taken(name, None).await? {
        warn!(name, "company name already registered");
        return Err(ConflictError::CompanyNameTaken.into());
    }
    if st.companies.count_owned_by(caller.id).await? >= MAX_COMPANIES_PER_USER {
        warn!(user_id = %caller.id, "company limit reached");
        return Err(ConflictError::CompanyLimitReached(MAX_COMPANIES_PER_USER).into());
    }

    let company = st
        .companies
        .insert(name, caller.id)
        .await
        .map_err(name_conflict)?;
    info!(company_id = %company.id, user_id = %caller.id, "company registered");
    Ok(company)
}

pub async fn list(st: &AppState) -> AppResult<Vec<Company>> {
    Ok(st.companies.list_all().await?)
}

pub async fn get(st: &AppState, id: Uuid) -> AppResult<Company> {
    Ok(st.companies.find_by_id(id).await?.ok_or(NotFoundError::Company)?)
}

/// Only the owner may update. Renames keep case-insensitive uniqueness.
#[instrument(skip(st, changes))]
pub async fn update(
    st: &AppState,
    caller: AuthUser,
    id: Uuid,
    changes: CompanyChanges,
) -> AppResult<Company> {
    let mut company = st
        .companies
        .find_by_id(id)
        .await?
        .ok_or(NotFoundError::Company)?;
    if company.user_id != caller.id {
        warn!(company_id = %id, user_id = %caller.id, "company update by non-owner");
        return Err(AuthorizationError::NotOwner.into());
    }

    if let Some(name) = changes.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        if !name.eq_ignore_ascii_case(&company.name) && st.companies.name_taken(name, Some(id)).await? {
            warn!(company_id = %id, name, "rename collides with existing company");
            return Err(ConflictError::CompanyNameTaken.into());
        }
        company.name = name.to_string();
    }
    if let Some(logo) = &changes.logo {
        check_upload(UploadKind::CompanyLogo, logo)?;
    }
    if let Some(description) = changes.description {
        company.description = Some(description.trim().to_string());
    }
    if let Some(website) = changes.website {
        company.website = Some(website.trim().to_string());
    }
    if let Some(location) = changes.location {
        company.location = Some(location.trim().to_string());
    }
    if let Some(logo) = changes.logo {
        company.logo = Some(store_upload(st, company.id, UploadKind::CompanyLogo, logo).await?);
    }

    let updated = st
        .companies
        .update(&company)
        .await
        .map_err(name_conflict)?
        .ok_or(NotFoundError::Company)?;
    info!(company_id = %id, "company updated");
    Ok(updated)
}

fn name_conflict(e: StoreError) -> crate::error::AppError {
    match e {
        StoreError::Conflict(_) => ConflictError::CompanyNameTaken.into(),
        other => other.into(),
    }
}
