//! Example login screen, without the rendering.
//!
//! The screen's controller posts actions; [`LoginStore`] reduces them into
//! [`LoginState`]; the controller reports the outcome once the login status
//! reaches a terminal value.

mod action;
mod auth;
mod controller;
mod state;
mod store;

pub use action::LoginAction;
pub use auth::{AuthError, Authenticator, StaticAuthenticator};
pub use controller::LoginController;
pub use state::{LoginState, LoginStatus};
pub use store::LoginStore;
