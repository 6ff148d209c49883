use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use uniflow::config::Config;
use uniflow::flux::{ActionReducer, LoggingInterceptor, Store};
use uniflow::login::{LoginAction, LoginController, LoginStatus, LoginStore, StaticAuthenticator};
use uniflow::{dispose_stores, init_stores_with, logging, Dispatcher, UiLoop};

const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run one login attempt against the example login screen.
#[derive(Debug, Parser)]
#[command(name = "uniflow-login", version)]
struct Cli {
    /// Username to log in with.
    #[arg(long, short)]
    username: String,

    /// Password to log in with.
    #[arg(long, short)]
    password: String,

    /// Config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip UI-loop affinity checks in the dispatcher.
    #[arg(long)]
    no_verify_threads: bool,

    /// Accepted user as NAME:PASSWORD (repeatable). Defaults to demo:demo.
    #[arg(long = "user", value_name = "NAME:PASSWORD")]
    users: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.no_verify_threads {
        config.dispatcher.verify_threads = false;
    }

    let authenticator = Arc::new(build_authenticator(&cli.users)?);

    let ui = UiLoop::spawn(&config.ui_loop.thread_name)
        .context("failed to start the UI loop thread")?;
    let dispatcher = Dispatcher::<LoginAction>::new(ui.handle(), config.dispatcher.clone());
    dispatcher.add_interceptor(Arc::new(LoggingInterceptor));

    let login_store = Arc::new(LoginStore::new(None));
    let stores: Vec<Arc<dyn Store>> = vec![login_store.clone() as Arc<dyn Store>];
    let report = init_stores_with(&stores, &config.bootstrap);
    tracing::debug!("\n{report}");

    let reducer: Arc<dyn ActionReducer<LoginAction>> = login_store.clone();
    dispatcher.add_action_reducer(reducer);

    let controller = LoginController::new(dispatcher, login_store, authenticator);
    let (result_tx, result_rx) = mpsc::channel();
    let _watch = controller.on_result(move |status| {
        let _ = result_tx.send(status);
    });
    controller.submit(&cli.username, &cli.password)?;

    let status = result_rx
        .recv_timeout(RESULT_TIMEOUT)
        .context("no login result from the UI loop")?;

    dispose_stores(&stores);
    ui.shutdown();

    match status {
        LoginStatus::Success => {
            println!("Logged in as {}", cli.username);
            Ok(())
        }
        LoginStatus::Failure(reason) => {
            eprintln!("Login failed: {reason}");
            std::process::exit(1);
        }
        other => bail!("unexpected login status {other:?}"),
    }
}

fn build_authenticator(users: &[String]) -> anyhow::Result<StaticAuthenticator> {
    if users.is_empty() {
        return Ok(StaticAuthenticator::new().with_user("demo", "demo"));
    }
    users
        .iter()
        .try_fold(StaticAuthenticator::new(), |auth, entry| {
            let Some((name, password)) = entry.split_once(':') else {
                bail!("invalid --user '{entry}', expected NAME:PASSWORD");
            };
            Ok(auth.with_user(name, password))
        })
}
