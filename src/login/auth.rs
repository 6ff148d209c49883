use std::collections::HashMap;

use thiserror::Error;

/// Reasons a login is rejected. The messages are shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("Wrong password")]
    WrongPassword,
}

/// Checks credentials for the login screen.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError>;
}

/// In-memory credential table.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        match self.users.get(username) {
            None => Err(AuthError::UnknownUser(username.to_string())),
            Some(expected) if expected == password => Ok(()),
            Some(_) => Err(AuthError::WrongPassword),
        }
    }
}
