use crate::types::error::AppError;

const MIN_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "letmein1", "admin123", "passw0rd", "trustno1",
    "abc12345", "11111111", "00000000", "superman", "starwars", "whatever",
];

/// Runs the password rules. `enabled` is false in dev, where any password is accepted.
pub fn validate_password(password: &str, username: &str, email: &str, enabled: bool) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("This password is empty.".into()));
    }
    if !enabled {
        return Ok(());
    }

    let mut problems = Vec::new();
    if password.chars().count() < MIN_LENGTH {
        problems.push(format!("This password is too short. It must contain at least {MIN_LENGTH} characters."));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }
    let local_part = email.split('@').next().unwrap_or_default().to_lowercase();
    let similar = [username.to_lowercase(), local_part]
        .iter()
        .filter(|attr| attr.len() >= 3)
        .any(|attr| lowered.contains(attr.as_str()) || attr.contains(lowered.as_str()));
    if similar {
        problems.push("The password is too similar to the username or email.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join(" ")))
    }
}

pub fn passwords_match(first: &str, second: &str) -> Result<(), AppError> {
    if first != second {
        return Err(AppError::Validation("The two password fields didn't match.".into()));
    }
    Ok(())
}
