// Field validators for untrusted request input.
//
// Every validator parses and normalizes raw input into a typed value or
// returns a structured issue; none of them write to the response. The only
// async validator is `verify_password`, which needs a bcrypt comparison.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::issue::ValidationIssue;
use crate::validation::object_id::ObjectId;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Maximum accepted image size: 5MB.
pub const MAX_IMAGE_SIZE_BYTES: u64 = 5_242_880;

pub const ALLOWED_IMAGE_MIMETYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/avif",
];

pub const BEARER_PREFIX: &str = "Bearer ";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

// Three dot-separated base64url sections.
static JWT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$").unwrap());

/// Trims, lowercases and shape-checks an email address.
pub fn validate_email(raw: &str) -> Result<String, ValidationIssue> {
    let email: String = raw.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationIssue::field("email", "required", "Email is required."));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationIssue::field("email", "invalid_format", "Invalid email format."));
    }

    Ok(email)
}

/// Trims a password and enforces the [6, 128] length bounds.
///
/// Bounds are counted in characters, not bytes, so multi-byte passwords
/// are measured the way users perceive them.
pub fn validate_password(raw: &str) -> Result<String, ValidationIssue> {
    let password: &str = raw.trim();
    let length: usize = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(ValidationIssue::field(
            "password",
            "too_small",
            format!("Password must be at least {} characters.", PASSWORD_MIN_LENGTH),
        ));
    }
    if length > PASSWORD_MAX_LENGTH {
        return Err(ValidationIssue::field(
            "password",
            "too_big",
            format!("Password must be at most {} characters.", PASSWORD_MAX_LENGTH),
        ));
    }

    Ok(password.to_string())
}

/// Shape-checks a JWT-like token: three dot-separated base64url sections.
pub fn validate_jwt(raw: &str) -> Result<String, ValidationIssue> {
    let token: &str = raw.trim();

    if token.is_empty() {
        return Err(ValidationIssue::root("required", "Token is required."));
    }
    if !JWT_REGEX.is_match(token) {
        return Err(ValidationIssue::root("invalid_format", "Invalid token format."));
    }

    Ok(token.to_string())
}

/// Strips the literal `"Bearer "` prefix off an Authorization header value.
pub fn validate_bearer(header: &str) -> Result<&str, ValidationIssue> {
    header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| ValidationIssue::root("invalid_format", "Invalid token format."))
}

/// Parses a path/body identifier into an [`ObjectId`].
pub fn validate_object_id(raw: &str) -> Result<ObjectId, ValidationIssue> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| ValidationIssue::field("id", "invalid_format", "Invalid ObjectId format."))
}

/// Uploaded image metadata, assembled by the transport layer before any
/// business logic runs.
#[derive(Debug, Clone)]
pub struct ImageUpload<'a> {
    pub field_name: String,
    pub original_name: String,
    pub encoding: String,
    pub mimetype: String,
    pub buffer: &'a [u8],
    pub size: u64,
}

/// Validates image upload metadata, collecting every failure.
pub fn validate_image_upload(upload: &ImageUpload<'_>) -> Result<(), Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    if upload.field_name.trim().is_empty() {
        issues.push(ValidationIssue::field("fieldname", "required", "Field name is required."));
    }
    if upload.original_name.trim().is_empty() {
        issues.push(ValidationIssue::field(
            "originalname",
            "required",
            "Original file name is required.",
        ));
    }
    if upload.encoding.trim().is_empty() {
        issues.push(ValidationIssue::field("encoding", "required", "Encoding is required."));
    }
    if !ALLOWED_IMAGE_MIMETYPES.contains(&upload.mimetype.as_str()) {
        issues.push(ValidationIssue::field(
            "mimetype",
            "invalid_format",
            "Only png, jpeg, jpg, webp and avif images are allowed.",
        ));
    }
    if upload.buffer.is_empty() {
        issues.push(ValidationIssue::field("buffer", "required", "Image data must not be empty."));
    }
    if upload.size == 0 {
        issues.push(ValidationIssue::field(
            "size",
            "too_small",
            "Image size must be a positive number.",
        ));
    } else if upload.size > MAX_IMAGE_SIZE_BYTES {
        issues.push(ValidationIssue::field(
            "size",
            "too_big",
            format!("Image must not exceed {} bytes (5MB).", MAX_IMAGE_SIZE_BYTES),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Compares a plaintext password against a stored bcrypt hash.
///
/// The failure message deliberately does not reveal which side differed.
pub async fn verify_password(plain: &str, encrypted: &str) -> Result<(), ValidationIssue> {
    let plain: String = plain.to_string();
    let encrypted: String = encrypted.to_string();

    let matches: bool =
        tokio::task::spawn_blocking(move || bcrypt::verify(plain.as_bytes(), &encrypted))
            .await
            .map(|result| result.unwrap_or(false))
            .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(ValidationIssue::root("invalid_credentials", "Invalid email or password."))
    }
}

/// Shipping address with four required fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Validates every field, collecting one issue per missing field.
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let fields: [(&str, &str, &str); 4] = [
            ("address", self.address.as_str(), "Address is required."),
            ("city", self.city.as_str(), "City is required."),
            ("postalCode", self.postal_code.as_str(), "Postal code is required."),
            ("country", self.country.as_str(), "Country is required."),
        ];

        let issues: Vec<ValidationIssue> = fields
            .iter()
            .filter(|(_, value, _)| value.trim().is_empty())
            .map(|(field, _, message)| ValidationIssue::field(field, "required", *message))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
