use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{parse_id, JsonBody},
    auth::jwt::AuthUser,
    error::AppResult,
    jobs::{
        dto::{JobDetails, JobInput, JobListResponse, JobResponse, JobWithCompany},
        repo::Job,
        services,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/post", post(post_job))
        .route("/get", get(list_jobs))
        .route("/getadminjobs", get(list_admin_jobs))
        .route("/get/:id", get(get_job))
        .route("/update/:id", put(update_job))
}

#[instrument(skip(state, payload))]
pub async fn post_job(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<JobInput>,
) -> AppResult<(StatusCode, Json<JobResponse<Job>>)> {
    let job = services::post(&state, auth, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            status: true,
            message: Some("Job posted successfully.".into()),
            job,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<JobListResponse>> {
    let jobs = services::list_all(&state).await?;
    Ok(Json(JobListResponse { status: true, jobs }))
}

#[instrument(skip(state))]
pub async fn list_admin_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<JobListResponse>> {
    let jobs = services::list_own(&state, auth).await?;
    Ok(Json(JobListResponse { status: true, jobs }))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<JobResponse<JobDetails>>> {
    let job = services::get(&state, parse_id(&id, "job")?).await?;
    Ok(Json(JobResponse {
        status: true,
        message: None,
        job,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<JobInput>,
) -> AppResult<Json<JobResponse<JobWithCompany>>> {
    let id = parse_id(&id, "job")?;
    let job = services::update(&state, auth, id, &payload).await?;
    Ok(Json(JobResponse {
        status: true,
        message: Some("Job updated successfully.".into()),
        job,
    }))
}
