use crate::error::DomainError;

/// User payload fields a caller may exempt from validation (login skips
/// the username; nothing else is ever skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Password,
    Email,
}

/// Check username/password/email shape. Fail-fast: the first violated
/// rule wins, in declaration order. Lengths count characters, not bytes.
pub fn validate_user(
    username: &str,
    password: &str,
    email: &str,
    exempt: &[UserField],
) -> Result<(), DomainError> {
    if !exempt.contains(&UserField::Username) {
        if username.is_empty() {
            return Err(DomainError::new("username is missing"));
        }
        if username.chars().count() > 20 {
            return Err(DomainError::new("username is longer than 20 characters"));
        }
        if username.chars().count() < 3 {
            return Err(DomainError::new("username is shorter than 3 characters"));
        }
    }

    if !exempt.contains(&UserField::Password) {
        if password.is_empty() {
            return Err(DomainError::new("password is missing"));
        }
        if password.chars().count() > 20 {
            return Err(DomainError::new("password is longer than 20 characters"));
        }
        if password.chars().count() < 6 {
            return Err(DomainError::new("password is shorter than 6 characters"));
        }
    }

    if !exempt.contains(&UserField::Email) {
        if email.is_empty() {
            return Err(DomainError::new("email is missing"));
        }
        if email.chars().count() > 40 {
            return Err(DomainError::new("email is longer than 40 characters"));
        }
        if !email_shape_ok(email) {
            return Err(DomainError::new("email is invalid"));
        }
    }

    Ok(())
}

pub fn validate_article(title: &str, body: &str, description: &str) -> Result<(), DomainError> {
    if title.is_empty() {
        return Err(DomainError::new("title is missing"));
    }
    if title.chars().count() > 40 {
        return Err(DomainError::new("title is longer than 40 characters"));
    }

    if body.is_empty() {
        return Err(DomainError::new("body is missing"));
    }

    if description.is_empty() {
        return Err(DomainError::new("description is missing"));
    }
    if description.chars().count() > 60 {
        return Err(DomainError::new("description is longer than 60 characters"));
    }

    Ok(())
}

/// `local@domain.tld`: ASCII letters/digits/underscore/dot before the
/// `@`, an alphanumeric first domain label, at least one dot after it.
fn email_shape_ok(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return false;
    }
    let Some((head, tail)) = domain.split_once('.') else {
        return false;
    };
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    !tail.is_empty()
        && tail
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
