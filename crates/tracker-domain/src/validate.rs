//! Input validation rules for user-chosen names and codes.
//!
//! Every rule returns the first failing check so the caller can surface a
//! single human-readable message.

/// Slugs that collide with top-level application routes.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin", "api", "auth", "login", "logout", "new", "settings", "signup",
];

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 30;
pub const IDENTIFIER_MIN_LEN: usize = 2;
pub const IDENTIFIER_MAX_LEN: usize = 6;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

pub const WORKSPACE_NAME_MAX_LEN: usize = 50;
pub const TEAM_NAME_MAX_LEN: usize = 50;
pub const PROJECT_NAME_MAX_LEN: usize = 100;
pub const USER_NAME_MAX_LEN: usize = 100;
pub const ISSUE_TITLE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("slug must be between 3 and 30 characters")]
    Length,
    #[error(
        "slug must start with a lowercase letter and contain only lowercase letters, numbers, and hyphens"
    )]
    Charset,
    #[error("slug cannot contain consecutive hyphens")]
    ConsecutiveHyphens,
    #[error("slug cannot end with a hyphen")]
    TrailingHyphen,
    #[error("slug is reserved")]
    Reserved,
}

/// Validate a workspace slug against `^[a-z][a-z0-9-]*$`, 3–30 chars,
/// no `--`, no trailing `-`, not reserved.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.len() < SLUG_MIN_LEN || slug.len() > SLUG_MAX_LEN {
        return Err(SlugError::Length);
    }
    let mut chars = slug.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    if !starts_with_letter
        || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(SlugError::Charset);
    }
    if slug.contains("--") {
        return Err(SlugError::ConsecutiveHyphens);
    }
    if slug.ends_with('-') {
        return Err(SlugError::TrailingHyphen);
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(SlugError::Reserved);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier must be between 2 and 6 characters")]
    Length,
    #[error("identifier must start with a letter and contain only letters and numbers")]
    Charset,
}

/// Trim and upper-case an identifier, then validate it against
/// `^[A-Z][A-Z0-9]{1,5}$`. Returns the normalized form.
pub fn normalize_identifier(raw: &str) -> Result<String, IdentifierError> {
    let identifier = raw.trim().to_ascii_uppercase();
    if identifier.len() < IDENTIFIER_MIN_LEN || identifier.len() > IDENTIFIER_MAX_LEN {
        return Err(IdentifierError::Length);
    }
    let mut chars = identifier.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(IdentifierError::Charset);
    }
    Ok(identifier)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("username must be between 3 and 30 characters")]
    Length,
    #[error("username can only contain letters, numbers, underscores, and dots")]
    Charset,
}

/// A validated username: `normalized` is the lower-cased unique key,
/// `display` keeps the casing the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username {
    pub normalized: String,
    pub display: String,
}

pub fn normalize_username(raw: &str) -> Result<Username, UsernameError> {
    let display = raw.trim();
    if display.len() < USERNAME_MIN_LEN || display.len() > USERNAME_MAX_LEN {
        return Err(UsernameError::Length);
    }
    if !display
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(UsernameError::Charset);
    }
    Ok(Username {
        normalized: display.to_ascii_lowercase(),
        display: display.to_owned(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Empty(&'static str),
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
}

/// Trim a required free-text field and bound its length (in characters).
pub fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::Empty(field));
    }
    if value.chars().count() > max {
        return Err(FieldError::TooLong(field, max));
    }
    Ok(value.to_owned())
}

/// Trim an optional free-text field; blank input collapses to `None`.
pub fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, FieldError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() > max => Err(FieldError::TooLong(field, max)),
        Some(value) => Ok(Some(value.to_owned())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("invalid email address")]
    Invalid,
}

/// Trim and lower-case an email address after a structural check.
pub fn normalize_email(raw: &str) -> Result<String, EmailError> {
    let email = raw.trim().to_ascii_lowercase();
    let (local, domain) = email.split_once('@').ok_or(EmailError::Invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    // A colon cannot appear in an otpauth account label.
    let bad_char = email.chars().any(|c| c.is_whitespace() || c == ':');
    if local.is_empty() || !domain_ok || bad_char {
        return Err(EmailError::Invalid);
    }
    Ok(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must be at most 128 characters")]
    TooLong,
}

pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(PasswordError::TooShort);
    }
    if len > PASSWORD_MAX_LEN {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}
