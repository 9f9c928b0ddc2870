//! Форматные проверки полей пропуска.

use once_cell::sync::Lazy;
use regex::Regex;

static BARCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9+\s\-()]+$").unwrap());

pub const ATTENDEE_NAME_MIN: usize = 2;
pub const ATTENDEE_NAME_MAX: usize = 100;

/// Обрезать пробелы; пустая строка превращается в `None`
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_barcode(barcode: &str) -> Result<(), String> {
    if barcode.is_empty() {
        return Err("Barcode is required".into());
    }
    if !BARCODE_RE.is_match(barcode) {
        return Err(format!(
            "Barcode '{}' must contain only letters and digits",
            barcode
        ));
    }
    Ok(())
}

pub fn validate_attendee_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(ATTENDEE_NAME_MIN..=ATTENDEE_NAME_MAX).contains(&len) {
        return Err(format!(
            "Attendee name must be between {} and {} characters",
            ATTENDEE_NAME_MIN, ATTENDEE_NAME_MAX
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if !EMAIL_RE.is_match(email) {
        return Err(format!("Invalid email address '{}'", email));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if !PHONE_RE.is_match(phone) {
        return Err(format!("Invalid phone number '{}'", phone));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(Some(" Ann ")), Some("Ann".to_string()));
    }

    #[test]
    fn test_barcode_must_be_alphanumeric() {
        assert!(validate_barcode("CYP0001").is_ok());
        assert!(validate_barcode("42").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("CYP-0001").is_err());
        assert!(validate_barcode("CYP 1").is_err());
    }

    #[test]
    fn test_attendee_name_length() {
        assert!(validate_attendee_name("A").is_err());
        assert!(validate_attendee_name("Al").is_ok());
        assert!(validate_attendee_name(&"x".repeat(100)).is_ok());
        assert!(validate_attendee_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_email_and_phone_formats() {
        assert!(validate_email("attendee1@example.com").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("a@b.c").is_err());

        assert!(validate_phone("+91-9000000001").is_ok());
        assert!(validate_phone("(044) 123 45").is_ok());
        assert!(validate_phone("call me").is_err());
    }
}
