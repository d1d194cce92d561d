use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    applications::repo::Application,
    companies::repo::CompanySummary,
    jobs::repo::Job,
};

/// Job create/update body. `experience` and `position` arrive either as
/// numbers or as numeric strings from form inputs.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub salary: Option<Value>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobWithCompany {
    #[serde(flatten)]
    pub job: Job,
    /// `None` when the referenced company no longer resolves.
    pub company: Option<CompanySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetails {
    #[serde(flatten)]
    pub job: Job,
    pub company: Option<CompanySummary>,
    pub applications: Vec<Application>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse<T> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub job: T,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub status: bool,
    pub jobs: Vec<JobWithCompany>,
}
