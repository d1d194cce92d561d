use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    applications::{
        dto::{
            ApplicantEntry, AppliedJob, ApplicationDetails, CompanyName, JobApplicants, JobBrief,
        },
        repo::{Application, ApplicationStatus},
    },
    auth::{jwt::AuthUser, repo_types::Role},
    companies::repo::CompanySummary,
    db::StoreError,
    error::{AppResult, AuthorizationError, ConflictError, NotFoundError, ValidationError},
    jobs::dto::JobWithCompany,
    state::AppState,
};

/// Role, then job existence, then the duplicate and self-application checks
/// that need the job record. The (job, applicant) unique key backs the
/// duplicate check against concurrent submissions.
#[instrument(skip(st))]
pub async fn apply(st: &AppState, caller: AuthUser, job_id: Uuid) -> AppResult<Application> {
    if caller.role != Role::Student {
        warn!(user_id = %caller.id, role = %caller.role, "non-student tried to apply");
        return Err(AuthorizationError::RoleNotAllowed(
            "Only students can apply for jobs. Recruiters cannot apply for jobs.",
        )
        .into());
    }
    let job = st.jobs.find_by_id(job_id).await?.ok_or(NotFoundError::Job)?;
    if st.applications.find_for(job.id, caller.id).await?.is_some() {
        warn!(%job_id, user_id = %caller.id, "duplicate application");
        return Err(ConflictError::AlreadyApplied.into());
    }
    if job.created_by == caller.id {
        warn!(%job_id, user_id = %caller.id, "self-application refused");
        return Err(AuthorizationError::SelfApplication.into());
    }

    let application = match st.applications.insert(job.id, caller.id).await {
        Ok(a) => a,
        Err(StoreError::Conflict(_)) => {
            warn!(%job_id, user_id = %caller.id, "duplicate application lost insert race");
            return Err(ConflictError::AlreadyApplied.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(application_id = %application.id, %job_id, user_id = %caller.id, "application created");
    Ok(application)
}

/// Applications whose job no longer resolves are left out.
pub async fn list_applied(st: &AppState, caller: AuthUser) -> AppResult<Vec<AppliedJob>> {
    let mut out = Vec::new();
    for app in st.applications.list_by_applicant(caller.id).await? {
        let Some(job) = st.jobs.find_by_id(app.job_id).await? else {
            warn!(application_id = %app.id, job_id = %app.job_id, "application references missing job");
            continue;
        };
        let company = st
            .companies
            .find_by_id(job.company_id)
            .await?
            .map(CompanySummary::from);
        out.push(AppliedJob {
            id: app.id,
            status: app.status,
            applicant: app.applicant_id,
            job: JobWithCompany { job, company },
            created_at: app.created_at,
            updated_at: app.updated_at,
        });
    }
    Ok(out)
}

/// Applicants whose user record is gone are dropped rather than failing the
/// listing.
pub async fn list_applicants(st: &AppState, job_id: Uuid) -> AppResult<JobApplicants> {
    let job = st.jobs.find_by_id(job_id).await?.ok_or(NotFoundError::Job)?;
    let mut applications = Vec::new();
    for app in st.applications.list_by_job(job.id).await? {
        match st.users.find_by_id(app.applicant_id).await? {
            Some(user) => applications.push(ApplicantEntry::new(app, user)),
            None => warn!(application_id = %app.id, "application without applicant"),
        }
    }
    Ok(JobApplicants { job, applications })
}

/// Only the recruiter owning the parent job may change the status. A missing
/// application and a foreign one fail the same way. Rewriting the current
/// status succeeds.
#[instrument(skip(st))]
pub async fn update_status(
    st: &AppState,
    caller: AuthUser,
    application_id: Uuid,
    status: Option<&str>,
) -> AppResult<Application> {
    let raw = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingStatus)?;
    let status: ApplicationStatus = raw
        .parse()
        .map_err(|_| ValidationError::InvalidStatus(raw.to_lowercase()))?;

    let application = st
        .applications
        .find_by_id(application_id)
        .await?
        .ok_or(NotFoundError::ApplicationOrNoPermission)?;
    let owns_job = st
        .jobs
        .find_by_id(application.job_id)
        .await?
        .is_some_and(|job| job.created_by == caller.id);
    if !owns_job {
        warn!(%application_id, user_id = %caller.id, "status update by non-owner");
        return Err(NotFoundError::ApplicationOrNoPermission.into());
    }

    let updated = st
        .applications
        .set_status(application_id, status)
        .await?
        .ok_or(NotFoundError::ApplicationOrNoPermission)?;
    info!(%application_id, from = %application.status, to = %status, "application status changed");
    Ok(updated)
}

pub async fn applicant_details(st: &AppState, application_id: Uuid) -> AppResult<ApplicationDetails> {
    let app = st
        .applications
        .find_by_id(application_id)
        .await?
        .ok_or(NotFoundError::Application)?;
    let applicant = st.users.find_by_id(app.applicant_id).await?.map(Into::into);
    let job = match st.jobs.find_by_id(app.job_id).await? {
        Some(job) => {
            let company = st
                .companies
                .find_by_id(job.company_id)
                .await?
                .map(|c| CompanyName { id: c.id, name: c.name });
            Some(JobBrief {
                id: job.id,
                title: job.title,
                company,
            })
        }
        None => None,
    };
    Ok(ApplicationDetails {
        id: app.id,
        status: app.status,
        applicant,
        job,
        created_at: app.created_at,
        updated_at: app.updated_at,
    })
}
