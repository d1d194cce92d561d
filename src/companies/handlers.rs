use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{parse_id, JsonBody},
    auth::jwt::AuthUser,
    companies::{
        dto::{CompanyChanges, CompanyListResponse, CompanyResponse, RegisterCompanyRequest},
        services,
    },
    error::AppResult,
    state::AppState,
    uploads::{read_form, FORM_BODY_LIMIT},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_company))
        .route("/get", get(list_companies))
        .route("/get/:id", get(get_company))
        .route("/update/:id", put(update_company))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

#[instrument(skip(state, payload))]
pub async fn register_company(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<RegisterCompanyRequest>,
) -> AppResult<(StatusCode, Json<CompanyResponse>)> {
    let company = services::register(&state, auth, payload.company_name.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            success: true,
            message: Some("Company registered successfully!".into()),
            company,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_companies(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<CompanyListResponse>> {
    let companies = services::list(&state).await?;
    Ok(Json(CompanyListResponse {
        success: true,
        companies,
    }))
}

#[instrument(skip(state))]
pub async fn get_company(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<CompanyResponse>> {
    let company = services::get(&state, parse_id(&id, "company")?).await?;
    Ok(Json(CompanyResponse {
        success: true,
        message: None,
        company,
    }))
}

/// PUT /companies/update/:id (multipart, optional `file` logo)
#[instrument(skip(state, mp))]
pub async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    mp: Multipart,
) -> AppResult<Json<CompanyResponse>> {
    let id = parse_id(&id, "company")?;
    let mut form = read_form(mp).await?;
    let changes = CompanyChanges {
        name: form.text("name").map(str::to_string),
        description: form.text("description").map(str::to_string),
        website: form.text("website").map(str::to_string),
        location: form.text("location").map(str::to_string),
        logo: form.take_file("file").or_else(|| form.take_file("logo")),
    };
    let company = services::update(&state, auth, id, changes).await?;
    Ok(Json(CompanyResponse {
        success: true,
        message: Some("Company updated successfully".into()),
        company,
    }))
}
