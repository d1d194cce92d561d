use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    applications::repo::{Application, ApplicationStatus},
    auth::repo_types::{Profile, User},
    jobs::{dto::JobWithCompany, repo::Job},
};

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// One of the caller's applications with its job and company.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub applicant: Uuid,
    pub job: JobWithCompany,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Profile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub has_resume: bool,
    pub resume_url: Option<String>,
    pub resume_file_name: Option<String>,
}

impl From<User> for ApplicantSummary {
    fn from(u: User) -> Self {
        let resume_url = u.profile.resume.clone().filter(|r| !r.trim().is_empty());
        Self {
            id: u.id,
            fullname: u.fullname,
            email: u.email,
            phone_number: u.phone_number,
            has_resume: resume_url.is_some(),
            resume_url,
            resume_file_name: u.profile.resume_original_name.clone(),
            profile: u.profile,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantEntry {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub job: Uuid,
    pub applicant: ApplicantSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ApplicantEntry {
    pub fn new(app: Application, applicant: User) -> Self {
        Self {
            id: app.id,
            status: app.status,
            job: app.job_id,
            applicant: applicant.into(),
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobApplicants {
    #[serde(flatten)]
    pub job: Job,
    pub applications: Vec<ApplicantEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Profile,
}

impl From<User> for ApplicantProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            fullname: u.fullname,
            email: u.email,
            phone_number: u.phone_number,
            profile: u.profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyName {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct JobBrief {
    pub id: Uuid,
    pub title: String,
    pub company: Option<CompanyName>,
}

/// Dangling applicant or job references serialize as `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub applicant: Option<ApplicantProfile>,
    pub job: Option<JobBrief>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct AppliedJobsResponse {
    pub success: bool,
    pub application: Vec<AppliedJob>,
}

#[derive(Debug, Serialize)]
pub struct ApplicantsResponse {
    pub success: bool,
    pub job: JobApplicants,
}

#[derive(Debug, Serialize)]
pub struct ApplicationDetailsResponse {
    pub success: bool,
    pub application: ApplicationDetails,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub application: Application,
}
