mod common;

use std::sync::{mpsc, Arc};
use std::time::Duration;

use uniflow::config::DispatcherConfig;
use uniflow::flux::{ActionReducer, LoggingInterceptor, Store};
use uniflow::login::{
    LoginAction, LoginController, LoginState, LoginStatus, LoginStore, StaticAuthenticator,
};
use uniflow::{init_stores, Dispatcher, UiLoop};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Screen {
    ui: UiLoop,
    dispatcher: Dispatcher<LoginAction>,
    store: Arc<LoginStore>,
    controller: LoginController,
}

fn screen() -> Screen {
    let ui = UiLoop::spawn("login-ui").expect("Failed to spawn UI loop");
    let dispatcher = Dispatcher::new(ui.handle(), DispatcherConfig::default());
    dispatcher.add_interceptor(Arc::new(LoggingInterceptor));

    let store = Arc::new(LoginStore::new(Some("ada".to_string())));
    let stores: Vec<Arc<dyn Store>> = vec![store.clone() as Arc<dyn Store>];
    init_stores(&stores);
    let reducer: Arc<dyn ActionReducer<LoginAction>> = store.clone();
    dispatcher.add_action_reducer(reducer);

    let authenticator = Arc::new(StaticAuthenticator::new().with_user("ada", "lovelace"));
    let controller = LoginController::new(dispatcher.clone(), Arc::clone(&store), authenticator);

    Screen {
        ui,
        dispatcher,
        store,
        controller,
    }
}

fn submit_and_wait(screen: &Screen, username: &str, password: &str) -> LoginStatus {
    let (tx, rx) = mpsc::channel();
    let _watch = screen.controller.on_result(move |status| {
        let _ = tx.send(status);
    });
    screen.controller.submit(username, password).unwrap();
    rx.recv_timeout(TIMEOUT).expect("No login result")
}

#[test]
fn bootstrap_primes_remembered_user() {
    let screen = screen();
    assert!(screen.store.is_initialized());
    assert!(screen.store.is_state_computed());
    assert_eq!(
        screen.store.state(),
        LoginState {
            status: LoginStatus::Idle,
            username: Some("ada".to_string()),
        }
    );
}

#[test]
fn valid_credentials_log_in() {
    let screen = screen();

    let status = submit_and_wait(&screen, "ada", "lovelace");

    assert_eq!(status, LoginStatus::Success);
    assert!(screen.store.state().is_logged_in());
}

#[test]
fn wrong_password_fails() {
    let screen = screen();

    let status = submit_and_wait(&screen, "ada", "babbage");

    assert_eq!(status, LoginStatus::Failure("Wrong password".to_string()));
    assert_eq!(screen.store.state().username.as_deref(), Some("ada"));
}

#[test]
fn empty_credentials_fail_before_authentication() {
    let screen = screen();

    let status = submit_and_wait(&screen, "", "");

    assert_eq!(
        status,
        LoginStatus::Failure("Username and password are required".to_string())
    );
}

#[test]
fn retry_after_failure_reports_new_outcome() {
    let screen = screen();

    assert!(matches!(
        submit_and_wait(&screen, "ada", "nope"),
        LoginStatus::Failure(_)
    ));
    assert_eq!(
        submit_and_wait(&screen, "ada", "lovelace"),
        LoginStatus::Success
    );
}

#[test]
fn logout_resets_state() {
    let screen = screen();
    submit_and_wait(&screen, "ada", "lovelace");

    screen.controller.logout().unwrap();
    common::flush(&screen.ui);

    assert_eq!(screen.store.state(), LoginState::default());
}

#[test]
fn direct_dispatch_off_loop_is_rejected() {
    let screen = screen();

    let result = screen.dispatcher.dispatch(LoginAction::Logout);

    assert!(result.is_err());
    assert_eq!(screen.store.state().status, LoginStatus::Idle);
}

#[test]
fn stray_outcome_surfaces_as_handler_error() {
    let screen = screen();

    let err = screen
        .dispatcher
        .dispatch_on_ui_sync(LoginAction::LoginSucceeded {
            username: "ada".to_string(),
        })
        .unwrap_err();

    assert!(!err.is_usage_error());
    assert_eq!(screen.store.state().status, LoginStatus::Idle);
}
