use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{parse_id, JsonBody, MessageResponse},
    applications::{
        dto::{
            ApplicantsResponse, ApplicationDetailsResponse, AppliedJobsResponse,
            StatusUpdateRequest, StatusUpdatedResponse,
        },
        services,
    },
    auth::jwt::AuthUser,
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/apply/:id", get(apply_job))
        .route("/get", get(list_applied_jobs))
        .route("/:id/applicants", get(list_applicants))
        .route("/status/:id/update", post(update_status))
        .route("/applicant/:id", get(applicant_details))
}

#[instrument(skip(state))]
pub async fn apply_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    services::apply(&state, auth, parse_id(&id, "job")?).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Application submitted")),
    ))
}

#[instrument(skip(state))]
pub async fn list_applied_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<AppliedJobsResponse>> {
    let application = services::list_applied(&state, auth).await?;
    Ok(Json(AppliedJobsResponse {
        success: true,
        application,
    }))
}

#[instrument(skip(state))]
pub async fn list_applicants(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApplicantsResponse>> {
    let job = services::list_applicants(&state, parse_id(&id, "job")?).await?;
    Ok(Json(ApplicantsResponse { success: true, job }))
}

#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusUpdateRequest>,
) -> AppResult<Json<StatusUpdatedResponse>> {
    let id = parse_id(&id, "application")?;
    let application = services::update_status(&state, auth, id, payload.status.as_deref()).await?;
    Ok(Json(StatusUpdatedResponse {
        success: true,
        message: "Application status updated".into(),
        application,
    }))
}

#[instrument(skip(state))]
pub async fn applicant_details(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApplicationDetailsResponse>> {
    let application = services::applicant_details(&state, parse_id(&id, "application")?).await?;
    Ok(Json(ApplicationDetailsResponse {
        success: true,
        application,
    }))
}
