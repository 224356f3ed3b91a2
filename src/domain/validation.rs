//! Field-level input checks run before any write.

use regex::Regex;
use std::sync::OnceLock;

use crate::constants::{accounts, catalog, feedback};

/// A rejected input value, reported back with the name of the field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[-a-zA-Z0-9_]+$")
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[\w.@+-]+$")
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
}

fn bounded_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, "This field may not be blank."));
    }
    if trimmed.chars().count() > max_len {
        return Err(FieldError::new(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn title_name(name: &str) -> Result<String, FieldError> {
    bounded_text("name", name, catalog::TITLE_NAME_MAX_LEN)
}

pub fn release_year(year: i32) -> Result<i32, FieldError> {
    if !(catalog::MIN_YEAR..=catalog::MAX_YEAR).contains(&year) {
        return Err(FieldError::new(
            "year",
            format!(
                "Year must be between {} and {}.",
                catalog::MIN_YEAR,
                catalog::MAX_YEAR
            ),
        ));
    }
    Ok(year)
}

pub fn taxonomy_name(name: &str) -> Result<String, FieldError> {
    bounded_text("name", name, catalog::TAXONOMY_NAME_MAX_LEN)
}

pub fn slug(slug: &str) -> Result<String, FieldError> {
    let slug = bounded_text("slug", slug, catalog::SLUG_MAX_LEN)?;
    if !slug_regex().is_match(&slug) {
        return Err(FieldError::new(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        ));
    }
    Ok(slug)
}

pub fn score(score: i32) -> Result<i32, FieldError> {
    if !(feedback::MIN_SCORE..=feedback::MAX_SCORE).contains(&score) {
        return Err(FieldError::new(
            "score",
            format!(
                "Score must be between {} and {}.",
                feedback::MIN_SCORE,
                feedback::MAX_SCORE
            ),
        ));
    }
    Ok(score)
}

/// Review and comment bodies: anything but blank.
pub fn text(text: &str) -> Result<String, FieldError> {
    if text.trim().is_empty() {
        return Err(FieldError::new("text", "This field may not be blank."));
    }
    Ok(text.to_string())
}

pub fn username(username: &str) -> Result<String, FieldError> {
    let username = bounded_text("username", username, accounts::USERNAME_MAX_LEN)?;
    if username.eq_ignore_ascii_case(accounts::RESERVED_USERNAME) {
        return Err(FieldError::new(
            "username",
            format!("The username '{username}' is reserved."),
        ));
    }
    if !username_regex().is_match(&username) {
        return Err(FieldError::new(
            "username",
            "Enter a valid username. Letters, digits and @/./+/-/_ only.",
        ));
    }
    Ok(username)
}

/// Lowercases the address so uniqueness is case-insensitive.
pub fn email(email: &str) -> Result<String, FieldError> {
    let email = bounded_text("email", email, accounts::EMAIL_MAX_LEN)?;
    if !email_regex().is_match(&email) {
        return Err(FieldError::new("email", "Enter a valid email address."));
    }
    Ok(email.to_lowercase())
}

pub fn password(password: &str) -> Result<&str, FieldError> {
    if password.chars().count() < accounts::MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            "password",
            format!(
                "Password must be at least {} characters.",
                accounts::MIN_PASSWORD_LEN
            ),
        ));
    }
    Ok(password)
}

/// Profile fields are free text but still length-capped.
pub fn profile_field(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.chars().count() > accounts::USERNAME_MAX_LEN {
        return Err(FieldError::new(
            field,
            format!(
                "Ensure this field has no more than {} characters.",
                accounts::USERNAME_MAX_LEN
            ),
        ));
    }
    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year_bounds() {
        assert!(release_year(1984).is_ok());
        assert!(release_year(2030).is_ok());
        assert_eq!(release_year(1983).unwrap_err().field, "year");
        assert!(release_year(2031).is_err());
    }

    #[test]
    fn test_score_bounds() {
        assert!(score(1).is_ok());
        assert!(score(10).is_ok());
        assert_eq!(score(0).unwrap_err().field, "score");
        assert!(score(11).is_err());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("sci-fi").unwrap(), "sci-fi");
        assert!(slug("sci_fi2").is_ok());
        assert!(slug("sci fi").is_err());
        assert!(slug("").is_err());
        assert!(slug(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_title_name_trims_and_caps() {
        assert_eq!(title_name("  The Matrix ").unwrap(), "The Matrix");
        assert!(title_name("   ").is_err());
        assert!(title_name(&"x".repeat(141)).is_err());
    }

    #[test]
    fn test_text_rejects_blank() {
        assert!(text("fine").is_ok());
        assert_eq!(text(" \n").unwrap_err().field, "text");
    }

    #[test]
    fn test_username() {
        assert!(username("neo.one+test@zion").is_ok());
        assert!(username("me").is_err());
        assert!(username("ME").is_err());
        assert!(username("has space").is_err());
        assert!(username(&"u".repeat(151)).is_err());
    }

    #[test]
    fn test_email_is_normalised() {
        assert_eq!(email("Neo@Zion.org").unwrap(), "neo@zion.org");
        assert!(email("no-at-sign").is_err());
        assert!(email("a@b").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(password("12345678").is_ok());
        assert_eq!(password("short").unwrap_err().field, "password");
    }
}
