use validator::ValidationError;

use crate::utils::slug::is_slug;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().len() < 3 {
        return Err(ValidationError::new("username_too_short"));
    }

    if username.len() > 150 {
        return Err(ValidationError::new("username_too_long"));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+'))
    {
        return Err(ValidationError::new("invalid_username_character"));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::new("password_too_short"));
    }

    if password.chars().all(|c| c.is_numeric()) {
        return Err(ValidationError::new("password_entirely_numeric"));
    }

    Ok(())
}

pub fn validate_slug(key: &str) -> Result<(), ValidationError> {
    if !is_slug(key) {
        return Err(ValidationError::new("invalid_slug"));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn validate_metadata(value: &serde_json::Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new("metadata_must_be_object"));
    }
    Ok(())
}
