use super::error::{USERNAME_MAX_LEN, USERNAME_MIN_LEN, ValidationError};

/// Trims and checks a username, returning the name to register.
pub fn validate_username(raw: &str, denylist: &[String]) -> Result<String, ValidationError> {
    let name = raw.trim();
    let len = name.chars().count();

    if len < USERNAME_MIN_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > USERNAME_MAX_LEN {
        return Err(ValidationError::UsernameTooLong);
    }

    let lowered = name.to_lowercase();
    if denylist
        .iter()
        .filter(|word| !word.is_empty())
        .any(|word| lowered.contains(&word.to_lowercase()))
    {
        return Err(ValidationError::UsernameDenied);
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::UsernameCharset);
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denylist() -> Vec<String> {
        vec!["badword".to_string()]
    }

    #[test]
    fn accepts_and_trims() {
        assert_eq!(
            validate_username("  magnus_99 ", &denylist()),
            Ok("magnus_99".to_string())
        );
        assert_eq!(validate_username("ab", &denylist()), Ok("ab".to_string()));
    }

    #[test]
    fn length_limits() {
        assert_eq!(
            validate_username(" a ", &denylist()),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            validate_username(&"x".repeat(21), &denylist()),
            Err(ValidationError::UsernameTooLong)
        );
        assert!(validate_username(&"x".repeat(20), &denylist()).is_ok());
    }

    #[test]
    fn charset_and_denylist() {
        assert_eq!(
            validate_username("hello world", &denylist()),
            Err(ValidationError::UsernameCharset)
        );
        assert_eq!(
            validate_username("café", &denylist()),
            Err(ValidationError::UsernameCharset)
        );
        assert_eq!(
            validate_username("xBadWordx", &denylist()),
            Err(ValidationError::UsernameDenied)
        );
        assert!(validate_username("xBadWordx", &[]).is_ok());
    }
}
