//! Credential checks and account naming for the cloud backend.
//!
//! Users pick a plain username; the backend only knows e-mail addresses, so
//! each username is mapped onto a synthetic address under a local domain.

use thiserror::Error;

pub(crate) const ACCOUNT_DOMAIN: &str = "financepro.local";
pub(crate) const MIN_USERNAME_LEN: usize = 6;
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ValidationError {
    #[error("Username is too short. It must be at least 6 characters.")]
    UsernameTooShort,
    #[error("Password is too short. It must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Please fill in all fields")]
    MissingField,
    #[error("New passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    NewPasswordTooShort,
}

/// A username/password pair that passed the length checks.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub(crate) fn new(username: &str, password: &str) -> Result<Self, ValidationError> {
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub(crate) fn email(&self) -> String {
        account_email(&self.username)
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Lowercase, drop all whitespace, append the account domain.
pub(crate) fn account_email(username: &str) -> String {
    let local: String = username
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    format!("{local}@{ACCOUNT_DOMAIN}")
}

pub(crate) fn display_username(email: &str) -> &str {
    match email.split_once('@') {
        Some((name, _)) if !name.is_empty() => name,
        Some(_) => "User",
        None if email.is_empty() => "User",
        None => email,
    }
}

/// Rewrite backend auth messages into something a user can act on.
pub(crate) fn friendly_auth_message(message: &str) -> String {
    if message.contains("Invalid login credentials") {
        "Incorrect username or password. Please try again.".to_string()
    } else if message.contains("User already registered") {
        "This username is already taken. Please choose another.".to_string()
    } else if message.contains("network") {
        "Network error. Please check your internet connection.".to_string()
    } else {
        message.to_string()
    }
}

/// A validated request to replace the signed-in user's password.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct PasswordChange {
    current: String,
    new: String,
}

impl PasswordChange {
    pub(crate) fn new(current: &str, new: &str, confirm: &str) -> Result<Self, ValidationError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(ValidationError::MissingField);
        }
        if new != confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::NewPasswordTooShort);
        }
        Ok(Self {
            current: current.to_string(),
            new: new.to_string(),
        })
    }

    pub(crate) fn current(&self) -> &str {
        &self.current
    }

    pub(crate) fn new_password(&self) -> &str {
        &self.new
    }
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}
