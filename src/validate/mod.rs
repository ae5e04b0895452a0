use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::upload::FileMeta;

/// Upload size ceiling enforced client-side: 20 MiB, matching the backend's limit.
pub const MAX_AUDIO_BYTES: u64 = 20 * 1024 * 1024;

/// MIME types the analysis endpoint accepts.
pub const ACCEPTED_AUDIO_TYPES: [&str; 2] = ["audio/mpeg", "audio/mp3"];

// Basic local@domain.tld shape. Deliverability is the backend's problem.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Field-level validation failures. Display strings are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email format")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Please upload a valid MP3 file")]
    UnsupportedType,
    #[error("File size should be less than 20MB")]
    TooLarge,
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Password rules: presence always, minimum length only when registering.
pub fn validate_password(value: &str, is_registration: bool) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if is_registration && value.chars().count() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_display_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if trimmed.chars().count() < 2 {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Type and size checks only; codec and duration are never inspected here.
pub fn validate_audio_file(file: &FileMeta) -> Result<(), ValidationError> {
    if !ACCEPTED_AUDIO_TYPES.contains(&file.mime.as_str()) {
        return Err(ValidationError::UnsupportedType);
    }
    if file.size > MAX_AUDIO_BYTES {
        return Err(ValidationError::TooLarge);
    }
    Ok(())
}
