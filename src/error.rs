use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::db::StoreError;

/// Malformed or missing input. Always reported before any write happens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidName(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid 10-digit mobile number")]
    InvalidPhone,
    #[error("Please enter a valid PAN card number")]
    InvalidPanCard,
    #[error("Please enter a valid 12-digit Aadhaar number")]
    InvalidAadhaar,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Role must be either Student or Recruiter")]
    InvalidRole,
    #[error("{0} is required")]
    MissingFile(&'static str),
    #[error("{0}")]
    InvalidFileType(&'static str),
    #[error("File exceeds the {0} MB limit")]
    FileTooLarge(usize),
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,
    #[error("status is required")]
    MissingStatus,
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("{0} must be a non-negative whole number")]
    InvalidNumber(&'static str),
    #[error("Invalid {0} id")]
    InvalidId(&'static str),
    #[error("Invalid form data")]
    MalformedForm,
    #[error("Invalid request body")]
    MalformedJson,
}

/// Uniqueness and duplicate-state violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConflictError {
    #[error("{0} already exists")]
    DuplicateField(&'static str),
    #[error("Email is already verified")]
    AlreadyVerified,
    #[error("You have already applied for this job")]
    AlreadyApplied,
    #[error("A company with this name already exists. Please choose a different name.")]
    CompanyNameTaken,
    #[error("You can create up to {0} companies")]
    CompanyLimitReached(i64),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("You don't have the necessary role to access this resource")]
    RoleMismatch,
    #[error("Please verify your email address before logging in")]
    EmailNotVerified,
    #[error("{0}")]
    RoleNotAllowed(&'static str),
    #[error("You cannot apply for your own job posting")]
    SelfApplication,
    #[error("You can only update your own companies")]
    NotOwner,
}

/// Missing entities. Ownership failures that must not leak existence are
/// reported through the `*OrNoPermission` variants.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("User not found")]
    User,
    #[error("Incorrect email or password")]
    Credentials,
    #[error("Company not found")]
    Company,
    #[error("Job not found")]
    Job,
    #[error("Job not found or you don't have permission to edit it")]
    JobOrNoPermission,
    #[error("Application not found")]
    Application,
    #[error("Application not found or you don't have permission to update it")]
    ApplicationOrNoPermission,
}

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("Failed to send OTP email. Please try again later.")]
    EmailDeliveryFailed,
    #[error("file storage failed: {0}")]
    Storage(anyhow::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Internal(InternalError::EmailDeliveryFailed) => self.to_string(),
            AppError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(InternalError::Unexpected(e))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(InternalError::Unexpected(e.into()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_not_verified: Option<bool>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            error!(error = %e, "request failed");
        }
        let email_not_verified =
            matches!(self, AppError::Authorization(AuthorizationError::EmailNotVerified))
                .then_some(true);
        let body = ErrorBody {
            success: false,
            message: self.public_message(),
            email_not_verified,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (ValidationError::InvalidOtp.into(), StatusCode::BAD_REQUEST),
            (ConflictError::AlreadyApplied.into(), StatusCode::BAD_REQUEST),
            (AuthenticationError::MissingToken.into(), StatusCode::UNAUTHORIZED),
            (AuthorizationError::SelfApplication.into(), StatusCode::FORBIDDEN),
            (NotFoundError::Job.into(), StatusCode::NOT_FOUND),
            (InternalError::EmailDeliveryFailed.into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let err: AppError = anyhow::anyhow!("connection refused to 10.0.0.3").into();
        assert_eq!(err.public_message(), "Server error");
    }

    #[test]
    fn email_not_verified_body_carries_marker() {
        let body = ErrorBody {
            success: false,
            message: AuthorizationError::EmailNotVerified.to_string(),
            email_not_verified: Some(true),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["emailNotVerified"], true);
        assert_eq!(json["success"], false);

        let plain = ErrorBody {
            success: false,
            message: "x".into(),
            email_not_verified: None,
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("emailNotVerified").is_none());
    }
}
