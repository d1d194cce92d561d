use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::{auth::repo_types::OtpCode, error::ValidationError};

/// How long an emailed code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Six-digit numeric code, 100000..=999999.
pub fn generate_otp(now: OffsetDateTime) -> OtpCode {
    let code = rand::thread_rng().gen_range(100_000..=999_999u32);
    OtpCode {
        code: code.to_string(),
        expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
    }
}

/// A wrong code is reported before expiry, even when both apply.
pub fn check_otp(stored: Option<&OtpCode>, submitted: &str, now: OffsetDateTime) -> Result<(), ValidationError> {
    let Some(stored) = stored else {
        return Err(ValidationError::InvalidOtp);
    };
    if stored.code != submitted.trim() {
        return Err(ValidationError::InvalidOtp);
    }
    if now > stored.expires_at {
        return Err(ValidationError::OtpExpired);
    }
    Ok(())
}
