pub const MIN_PASSWORD_LEN: usize = 8;

/// Email must be present, at most 254 chars, and contain '@' and '.'.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email and password required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email must be a valid address".to_string());
    }
    None
}

pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Email and password required".to_string());
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Some(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    None
}

/// A required, trimmed text field with a max length.
pub fn validate_required(value: &str, message: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(message.to_string());
    }
    if trimmed.len() > max_len {
        return Some(format!("Must be at most {max_len} characters"));
    }
    None
}
