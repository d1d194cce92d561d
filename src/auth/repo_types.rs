use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Student,
    Recruiter,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Recruiter => "Recruiter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Student" => Ok(Role::Student),
            "Recruiter" => Ok(Role::Recruiter),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub resume: Option<String>,
    pub resume_original_name: Option<String>,
    pub profile_photo: String,
}

/// Pending email verification code. Code and expiry only exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

/// User record. Serializes to the sanitised public shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub pan_card: String,
    pub aadhaar_card: String,
    pub role: Role,
    pub profile: Profile,
    pub is_email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification: Option<OtpCode>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub pan_card: String,
    pub aadhaar_card: String,
    pub role: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub resume: Option<String>,
    pub resume_original_name: Option<String>,
    pub profile_photo: String,
    pub is_email_verified: bool,
    pub email_verification_otp: Option<String>,
    pub email_verification_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|_| anyhow::anyhow!("unknown role {:?} for user {}", r.role, r.id))?;
        let email_verification = match (r.email_verification_otp, r.email_verification_expiry) {
            (Some(code), Some(expires_at)) => Some(OtpCode { code, expires_at }),
            _ => None,
        };
        Ok(Self {
            id: r.id,
            fullname: r.fullname,
            email: r.email,
            phone_number: r.phone_number,
            password_hash: r.password_hash,
            pan_card: r.pan_card,
            aadhaar_card: r.aadhaar_card,
            role,
            profile: Profile {
                bio: r.bio,
                skills: r.skills,
                resume: r.resume,
                resume_original_name: r.resume_original_name,
                profile_photo: r.profile_photo,
            },
            is_email_verified: r.is_email_verified,
            email_verification,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated registration ready for insertion. Always unverified.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub pan_card: String,
    pub aadhaar_card: String,
    pub role: Role,
    pub profile_photo: String,
    pub otp: OtpCode,
}

/// Globally unique user attributes, in the order registration checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PanCard,
    AadhaarCard,
    PhoneNumber,
}

impl UniqueField {
    pub const ALL: [UniqueField; 4] = [
        UniqueField::Email,
        UniqueField::PanCard,
        UniqueField::AadhaarCard,
        UniqueField::PhoneNumber,
    ];

    pub fn column(self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::PanCard => "pan_card",
            UniqueField::AadhaarCard => "aadhaar_card",
            UniqueField::PhoneNumber => "phone_number",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UniqueField::Email => "Email",
            UniqueField::PanCard => "PAN number",
            UniqueField::AadhaarCard => "Aadhaar number",
            UniqueField::PhoneNumber => "Phone number",
        }
    }

    /// Resolves a violated constraint name back to the field.
    pub fn from_constraint(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| name == format!("users_{}_key", f.column()))
    }
}
