//! Input checks shared by registration and the newsletter.

/// Validates a username.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters long");
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long");
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username must only contain alphanumeric characters and underscores");
    }

    Ok(())
}

/// Validates a password.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long");
    }

    Ok(())
}

/// Validates an email. The domain part must contain a dot, so `user@localhost`
/// is rejected.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 {
        return Err("Email must be at most 254 characters long");
    }

    if !email_address::EmailAddress::is_valid(email) {
        return Err("Invalid email address");
    }

    let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email address");
    }

    Ok(())
}
