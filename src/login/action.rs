use std::fmt;

use crate::flux::{Action, TaggedAction};

/// Actions understood by the login screen.
#[derive(Clone, PartialEq, Eq)]
pub enum LoginAction {
    /// The user submitted the form.
    Login { username: String, password: String },
    /// Credentials were accepted.
    LoginSucceeded { username: String },
    /// Credentials were rejected.
    LoginFailed { reason: String },
    Logout,
}

impl LoginAction {
    pub const LOGIN: &'static str = "login";
    pub const LOGIN_SUCCEEDED: &'static str = "login_succeeded";
    pub const LOGIN_FAILED: &'static str = "login_failed";
    pub const LOGOUT: &'static str = "logout";

    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginAction::Login {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether this action reports the outcome of a pending login.
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            LoginAction::LoginSucceeded { .. } | LoginAction::LoginFailed { .. }
        )
    }
}

impl Action for LoginAction {}

impl TaggedAction for LoginAction {
    fn tag(&self) -> &'static str {
        match self {
            LoginAction::Login { .. } => Self::LOGIN,
            LoginAction::LoginSucceeded { .. } => Self::LOGIN_SUCCEEDED,
            LoginAction::LoginFailed { .. } => Self::LOGIN_FAILED,
            LoginAction::Logout => Self::LOGOUT,
        }
    }
}

// Passwords never reach the logs.
impl fmt::Debug for LoginAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginAction::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            LoginAction::LoginSucceeded { username } => f
                .debug_struct("LoginSucceeded")
                .field("username", username)
                .finish(),
            LoginAction::LoginFailed { reason } => f
                .debug_struct("LoginFailed")
                .field("reason", reason)
                .finish(),
            LoginAction::Logout => f.write_str("Logout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", LoginAction::login("ada", "hunter2"));
        assert!(rendered.contains("ada"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn tags_are_distinct() {
        let actions = [
            LoginAction::login("a", "b"),
            LoginAction::LoginSucceeded {
                username: "a".into(),
            },
            LoginAction::LoginFailed {
                reason: "nope".into(),
            },
            LoginAction::Logout,
        ];
        let mut tags: Vec<_> = actions.iter().map(|a| a.tag()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), 4);
        assert_eq!(actions.iter().filter(|a| a.is_outcome()).count(), 2);
    }
}
