use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z\s]+$").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"^\d+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
    static ref PAN_RE: Regex = Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap();
    static ref AADHAAR_RE: Regex = Regex::new(r"^[0-9]{12}$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 50;

/// Returns the name in Title Case with single spaces.
pub fn normalize_fullname(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidName("Full name is required"));
    }
    if trimmed.chars().count() < 2 {
        return Err(ValidationError::InvalidName(
            "Full name must be at least 2 characters long",
        ));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidName(
            "Full name must be at most 50 characters long",
        ));
    }
    if DIGITS_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidName("Full name cannot be only numbers"));
    }
    if !NAME_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidName(
            "Full name can only contain letters and spaces",
        ));
    }
    Ok(trimmed
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" "))
}

pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let phone = raw.trim();
    if !PHONE_RE.is_match(phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(phone.to_string())
}

pub fn normalize_pan(raw: &str) -> Result<String, ValidationError> {
    let pan = raw.trim().to_uppercase();
    if !PAN_RE.is_match(&pan) {
        return Err(ValidationError::InvalidPanCard);
    }
    Ok(pan)
}

pub fn normalize_aadhaar(raw: &str) -> Result<String, ValidationError> {
    let aadhaar = raw.trim();
    if !AADHAAR_RE.is_match(aadhaar) {
        return Err(ValidationError::InvalidAadhaar);
    }
    Ok(aadhaar.to_string())
}

pub fn check_password(raw: &str) -> Result<(), ValidationError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Comma-separated list, trimmed, empties dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
