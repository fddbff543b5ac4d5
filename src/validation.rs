//! Field checks shared by the signup and catalog flows.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use validator::ValidateEmail;

use crate::error::AppError;

pub const EMPTY_FIELD: &str = "Field can't be empty!";
pub const MALICIOUS_INPUT: &str = "Some malicious or invalid inputs found!";

pub const MIN_PASSWORD_LEN: usize = 6;

// Opening, closing or self-closing tags, comments and doctype declarations.
// Any tag rejects the whole field, even when text remains around it.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)</?[a-z!][^>]*>").expect("markup pattern is valid")
});

/// Fails with `Field can't be empty!` when any of `fields` is blank.
pub fn require_non_empty(fields: &[&str]) -> Result<(), AppError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::Validation(EMPTY_FIELD.to_string()));
    }
    Ok(())
}

/// Fails when any of `fields` carries HTML markup.
pub fn require_sanitized(fields: &[&str]) -> Result<(), AppError> {
    if fields.iter().any(|f| contains_markup(f)) {
        return Err(AppError::Validation(MALICIOUS_INPUT.to_string()));
    }
    Ok(())
}

pub fn contains_markup(value: &str) -> bool {
    MARKUP.is_match(value)
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

pub fn has_whitespace(value: &str) -> bool {
    value.chars().any(char::is_whitespace)
}

/// Parses a release date written `YYYY/MM/DD` or `YYYY-MM-DD`.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    ["%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Trims and lower-cases a catalog text field.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
