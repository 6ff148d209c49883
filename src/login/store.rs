use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use anyhow::bail;

use super::action::LoginAction;
use super::state::{LoginState, LoginStatus};
use crate::flux::{ActionReducer, ReducerTable, StateSubject, Store};

/// Owns the login screen's state.
///
/// The initial state is computed on first read, so the bootstrap utility
/// primes it explicitly.
pub struct LoginStore {
    remembered_user: Option<String>,
    initialized: AtomicBool,
    subject: OnceLock<StateSubject<LoginState>>,
    table: ReducerTable<LoginState, LoginAction>,
}

impl LoginStore {
    /// `remembered_user` pre-fills the username of the initial state.
    pub fn new(remembered_user: Option<String>) -> Self {
        Self {
            remembered_user,
            initialized: AtomicBool::new(false),
            subject: OnceLock::new(),
            table: login_table(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> LoginState {
        self.subject().get()
    }

    /// State stream observed by the screen.
    pub fn subject(&self) -> &StateSubject<LoginState> {
        self.subject.get_or_init(|| {
            tracing::debug!("Computing initial login state");
            StateSubject::new(LoginState {
                status: LoginStatus::Idle,
                username: self.remembered_user.clone(),
            })
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Whether the initial state has been computed yet.
    pub fn is_state_computed(&self) -> bool {
        self.subject.get().is_some()
    }
}

impl Store for LoginStore {
    fn name(&self) -> &str {
        "LoginStore"
    }

    fn init(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    fn prime_state(&self) {
        self.subject();
    }
}

impl ActionReducer<LoginAction> for LoginStore {
    fn reduce(&self, action: &LoginAction) -> anyhow::Result<()> {
        let subject = self.subject();
        let current = subject.get();

        if action.is_outcome() && current.status != LoginStatus::InProgress {
            bail!(
                "received {:?} while login status is {:?}",
                action,
                current.status
            );
        }

        let (next, matched) = self.table.reduce(current.clone(), action);
        if matched && next != current {
            tracing::debug!(from = ?current.status, to = ?next.status, "Login state changed");
            subject.publish(next);
        }
        Ok(())
    }
}

fn login_table() -> ReducerTable<LoginState, LoginAction> {
    ReducerTable::new()
        .on(LoginAction::LOGIN, begin_login)
        .on(LoginAction::LOGIN_SUCCEEDED, login_succeeded)
        .on(LoginAction::LOGIN_FAILED, login_failed)
        .on(LoginAction::LOGOUT, |_, _| LoginState::default())
}

fn begin_login(state: LoginState, action: &LoginAction) -> LoginState {
    match action {
        LoginAction::Login { username, .. } => LoginState {
            status: LoginStatus::InProgress,
            username: Some(username.clone()),
        },
        _ => state,
    }
}

fn login_succeeded(state: LoginState, action: &LoginAction) -> LoginState {
    match action {
        LoginAction::LoginSucceeded { username } => LoginState {
            status: LoginStatus::Success,
            username: Some(username.clone()),
        },
        _ => state,
    }
}

fn login_failed(state: LoginState, action: &LoginAction) -> LoginState {
    match action {
        LoginAction::LoginFailed { reason } => LoginState {
            status: LoginStatus::Failure(reason.clone()),
            ..state
        },
        _ => state,
    }
}
