use std::sync::Arc;

use super::action::LoginAction;
use super::auth::{AuthError, Authenticator};
use super::state::LoginStatus;
use super::store::LoginStore;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::flux::{on_next_terminal_state, Subscription};

/// Glue between the login form and the store.
///
/// Every action is posted to the UI loop, so `submit` may be called from
/// any thread, including the one a real screen would use for input.
pub struct LoginController {
    dispatcher: Dispatcher<LoginAction>,
    store: Arc<LoginStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl LoginController {
    pub fn new(
        dispatcher: Dispatcher<LoginAction>,
        store: Arc<LoginStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            authenticator,
        }
    }

    /// Start a login attempt and post its outcome once credentials are
    /// checked.
    pub fn submit(&self, username: &str, password: &str) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch_on_ui(LoginAction::login(username, password))?;

        let outcome = match self.check(username, password) {
            Ok(()) => LoginAction::LoginSucceeded {
                username: username.to_string(),
            },
            Err(err) => {
                tracing::info!(user = %username, reason = %err, "Login rejected");
                LoginAction::LoginFailed {
                    reason: err.to_string(),
                }
            }
        };
        self.dispatcher.dispatch_on_ui(outcome)
    }

    pub fn logout(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch_on_ui(LoginAction::Logout)
    }

    /// Call `callback` with the next terminal login status (success or
    /// failure). Keep the returned subscription alive until then.
    pub fn on_result<F>(&self, callback: F) -> Subscription
    where
        F: FnOnce(LoginStatus) + Send + 'static,
    {
        on_next_terminal_state(
            self.store.subject(),
            |state| state.status.clone(),
            callback,
        )
    }

    fn check(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.authenticator.authenticate(username, password)
    }
}
