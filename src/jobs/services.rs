use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    api::{parse_id, required},
    auth::{jwt::AuthUser, repo_types::Role, validation::split_list},
    companies::repo::CompanySummary,
    error::{AppResult, AuthorizationError, NotFoundError, ValidationError},
    jobs::{
        dto::{JobDetails, JobInput, JobWithCompany},
        repo::{Job, JobDraft},
    },
    state::AppState,
};

/// Validates every field before anything is read or written.
pub fn draft_from_input(input: &JobInput) -> Result<JobDraft, ValidationError> {
    let title = required(input.title.as_deref(), "title")?;
    let description = required(input.description.as_deref(), "description")?;
    let requirements = required(input.requirements.as_deref(), "requirements")?;
    let salary = text_or_number(input.salary.as_ref(), "salary")?;
    let location = required(input.location.as_deref(), "location")?;
    let job_type = required(input.job_type.as_deref(), "jobType")?;
    let experience_level = whole_number(input.experience.as_ref(), "experience")?;
    let position = whole_number(input.position.as_ref(), "position")?;
    let company_id = parse_id(required(input.company_id.as_deref(), "companyId")?, "company")?;

    Ok(JobDraft {
        title: title.to_string(),
        description: description.to_string(),
        requirements: split_list(requirements),
        salary,
        experience_level,
        location: location.to_string(),
        job_type: job_type.to_string(),
        position,
        company_id,
    })
}

fn text_or_number(value: Option<&Value>, name: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(Value::String(s)) => required(Some(s.as_str()), name).map(str::to_string),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ValidationError::MissingField(name)),
    }
}

fn whole_number(value: Option<&Value>, name: &'static str) -> Result<i32, ValidationError> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingField(name)),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ValidationError::MissingField(name))
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(_) => None,
    };
    parsed
        .filter(|n| *n >= 0)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or(ValidationError::InvalidNumber(name))
}

async fn with_company(st: &AppState, job: Job) -> AppResult<JobWithCompany> {
    let company = st
        .companies
        .find_by_id(job.company_id)
        .await?
        .map(CompanySummary::from);
    Ok(JobWithCompany { job, company })
}

#[instrument(skip(st, input))]
pub async fn post(st: &AppState, caller: AuthUser, input: &JobInput) -> AppResult<Job> {
    if caller.role != Role::Recruiter {
        warn!(user_id = %caller.id, "non-recruiter tried to post a job");
        return Err(AuthorizationError::RoleNotAllowed("Only recruiters can post jobs").into());
    }
    let draft = draft_from_input(input)?;
    if st.companies.find_by_id(draft.company_id).await?.is_none() {
        warn!(company_id = %draft.company_id, "job posted for unknown company");
        return Err(NotFoundError::Company.into());
    }

    let job = st.jobs.insert(&draft, caller.id).await?;
    info!(job_id = %job.id, user_id = %caller.id, "job posted");
    Ok(job)
}

pub async fn list_all(st: &AppState) -> AppResult<Vec<JobWithCompany>> {
    let mut out = Vec::new();
    for job in st.jobs.list_all().await? {
        out.push(with_company(st, job).await?);
    }
    Ok(out)
}

/// Jobs created by the caller.
pub async fn list_own(st: &AppState, caller: AuthUser) -> AppResult<Vec<JobWithCompany>> {
    let mut out = Vec::new();
    for job in st.jobs.list_by_creator(caller.id).await? {
        out.push(with_company(st, job).await?);
    }
    Ok(out)
}

/// The application list is read from the applications table.
pub async fn get(st: &AppState, id: Uuid) -> AppResult<JobDetails> {
    let job = st.jobs.find_by_id(id).await?.ok_or(NotFoundError::Job)?;
    let applications = st.applications.list_by_job(job.id).await?;
    let JobWithCompany { job, company } = with_company(st, job).await?;
    Ok(JobDetails {
        job,
        company,
        applications,
    })
}

/// Absent and foreign jobs fail identically.
#[instrument(skip(st, input))]
pub async fn update(
    st: &AppState,
    caller: AuthUser,
    id: Uuid,
    input: &JobInput,
) -> AppResult<JobWithCompany> {
    let draft = draft_from_input(input)?;
    match st.jobs.find_by_id(id).await? {
        Some(job) if job.created_by == caller.id => {}
        _ => {
            warn!(job_id = %id, user_id = %caller.id, "job update refused");
            return Err(NotFoundError::JobOrNoPermission.into());
        }
    }
    if st.companies.find_by_id(draft.company_id).await?.is_none() {
        return Err(NotFoundError::Company.into());
    }

    let job = st
        .jobs
        .update(id, &draft)
        .await?
        .ok_or(NotFoundError::JobOrNoPermission)?;
    info!(job_id = %id, "job updated");
    with_company(st, job).await
}
