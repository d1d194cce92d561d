use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{JsonBody, MessageResponse},
    auth::{
        dto::{
            LoginRequest, ProfileChanges, RegisterForm, RegisterResponse, ResendOtpRequest,
            UserResponse, VerifyEmailRequest,
        },
        jwt::{cleared_session_cookie, AuthUser, JwtKeys},
        services,
    },
    error::AppResult,
    state::AppState,
    uploads::{read_form, FORM_BODY_LIMIT},
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/update-profile", put(update_profile))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

/// POST /users/register (multipart)
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Multipart,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let mut form = read_form(mp).await?;
    let text = |name: &str| form.text(name).map(str::to_string);
    let mut input = RegisterForm {
        fullname: text("fullname"),
        email: text("email"),
        phone_number: text("phoneNumber"),
        password: text("password"),
        pan_card: text("pancard"),
        aadhaar_card: text("adharcard"),
        role: text("role"),
        profile_photo: None,
    };
    input.profile_photo = form.take_file("profilePhoto").or_else(|| form.take_file("file"));

    let registered = services::register(&state, input).await?;
    let message = if registered.email_sent {
        "Account created successfully. Please check your email for the verification code."
    } else {
        "Account created, but the verification email could not be sent. Please request a new code."
    };
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: message.into(),
            email_sent: registered.email_sent,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VerifyEmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::verify_email(&state, payload.email.as_deref(), payload.otp.as_deref()).await?;
    Ok(Json(MessageResponse::ok(
        "Email verified successfully. You can now log in.",
    )))
}

#[instrument(skip(state, payload))]
pub async fn resend_otp(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ResendOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::resend_otp(&state, payload.email.as_deref()).await?;
    Ok(Json(MessageResponse::ok("A new OTP has been sent to your email")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (user, token) = services::login(
        &state,
        payload.email.as_deref(),
        payload.password.as_deref(),
        payload.role.as_deref(),
    )
    .await?;

    let cookie = JwtKeys::from_ref(&state).session_cookie(&token, state.config.cookie_secure)?;
    let message = format!("Welcome back {}", user.fullname);
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse {
            success: true,
            message,
            user,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, cleared_session_cookie(state.config.cookie_secure))]),
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = services::get_me(&state, auth.id).await?;
    Ok(Json(UserResponse {
        success: true,
        message: "Profile loaded".into(),
        user,
    }))
}

/// PUT /users/update-profile (multipart)
#[instrument(skip(state, mp))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    mp: Multipart,
) -> AppResult<Json<UserResponse>> {
    let mut form = read_form(mp).await?;
    let changes = ProfileChanges {
        bio: form.text("bio").map(str::to_string),
        skills: form.text("skills").map(str::to_string),
        resume: form.take_file("resume").or_else(|| form.take_file("file")),
        profile_photo: form.take_file("profilePhoto"),
    };
    let user = services::update_profile(&state, auth.id, changes).await?;
    Ok(Json(UserResponse {
        success: true,
        message: "Profile updated successfully".into(),
        user,
    }))
}
