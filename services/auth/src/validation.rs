//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate that a trimmed value has between `min` and `max` characters
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();

    if len == 0 {
        return Err(format!("{} is required", field));
    }

    if len < min {
        return Err(format!("{} must be at least {} characters long", field, min));
    }

    if len > max {
        return Err(format!("{} must be at most {} characters long", field, max));
    }

    Ok(())
}

/// Validate phone, exactly ten digits
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("Phone is required".to_string());
    }

    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone must be exactly 10 digits".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let len = password.chars().count();
    if !(8..=20).contains(&len) {
        return Err("Password must be between 8 and 20 characters long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if !has_special {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_length("name", "Éva", 3, 40).is_ok());
        assert!(validate_length("name", "  ", 3, 40).is_err());
        assert_eq!(
            validate_length("name", "ab", 3, 40).unwrap_err(),
            "name must be at least 3 characters long"
        );
    }

    #[test]
    fn phone_needs_ten_digits() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("98765432101").is_err());
        assert!(validate_phone("98765-4321").is_err());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("reader@books.land").is_ok());
        assert!(validate_email("reader@books").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("Wayyyyy!Too!Long!123").is_ok());
        assert!(validate_password("Wayyyyy!Too!Long!1234").is_err());
        assert!(validate_password("nouppercase1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }
}
