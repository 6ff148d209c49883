//! State for the login screen.

use crate::flux::{StoreState, Terminal};

/// Progress of the current login attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginStatus {
    /// No attempt made yet, or logged out.
    #[default]
    Idle,

    /// Credentials submitted, waiting for the outcome.
    InProgress,

    /// Logged in.
    Success,

    /// Login rejected, with a user-facing reason.
    Failure(String),
}

impl Terminal for LoginStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, LoginStatus::Success | LoginStatus::Failure(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    pub status: LoginStatus,
    /// User of the current or last attempt, pre-filled from config.
    pub username: Option<String>,
}

impl StoreState for LoginState {}

impl LoginState {
    pub fn is_logged_in(&self) -> bool {
        self.status == LoginStatus::Success
    }

    /// Whether the form should be locked while waiting for an outcome.
    pub fn is_busy(&self) -> bool {
        self.status == LoginStatus::InProgress
    }
}
