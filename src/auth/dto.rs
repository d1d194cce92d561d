use serde::{Deserialize, Serialize};

use crate::{auth::repo_types::User, uploads::UploadItem};

/// Multipart registration form. Every field is optional here so that
/// missing input is reported as a validation error, not a parse failure.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub pan_card: Option<String>,
    pub aadhaar_card: Option<String>,
    pub role: Option<String>,
    pub profile_photo: Option<UploadItem>,
}

#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub resume: Option<UploadItem>,
    pub profile_photo: Option<UploadItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResendOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub email_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}
