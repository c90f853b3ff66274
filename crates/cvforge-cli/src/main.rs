//! cvforge - command-line client for the cvforge account service.
//!
//! Signs in and out, restores the previous session from the refresh cookie,
//! and shows or edits the account profile.

mod app;
mod render;

use std::io;

use anyhow::{bail, Result};
use cvforge_core::Config;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Set to `1` to also write logs to a daily file in the cache directory
const LOG_FILE_ENV: &str = "CVFORGE_LOG_FILE";

const USAGE: &str = "\
Usage: cvforge <command>

Commands:
  status                        Show who is signed in
  login [email]                 Sign in
  register [email]              Create an account and sign in
  logout                        Sign out on this device
  profile                       Show the profile
  profile set <field=value>...  Edit the profile
  forgot-password [email]       Send password reset instructions
  reset-password <token>        Choose a new password from a reset link";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Status,
    Login(Option<String>),
    Register(Option<String>),
    Logout,
    Profile,
    ProfileSet(Vec<String>),
    ForgotPassword(Option<String>),
    ResetPassword(String),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let rest = args.get(1..).unwrap_or_default();
    let arg = |i: usize| rest.get(i).cloned();

    let command = match rest.first().map(String::as_str) {
        None | Some("status") => Command::Status,
        Some("login") => Command::Login(arg(1)),
        Some("register") => Command::Register(arg(1)),
        Some("logout") => Command::Logout,
        Some("profile") => match rest.get(1).map(String::as_str) {
            None => Command::Profile,
            Some("set") => Command::ProfileSet(rest[2..].to_vec()),
            Some(other) => bail!("Unknown profile command `{}`\n\n{}", other, USAGE),
        },
        Some("forgot-password") => Command::ForgotPassword(arg(1)),
        Some("reset-password") => match arg(1) {
            Some(token) => Command::ResetPassword(token),
            None => bail!("reset-password needs the token from the reset link"),
        },
        Some("help" | "-h" | "--help") => Command::Help,
        Some(other) => bail!("Unknown command `{}`\n\n{}", other, USAGE),
    };
    Ok(command)
}

/// Initialize the tracing subscriber for logging
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = match std::env::var(LOG_FILE_ENV).as_deref() {
        Ok("1") => config.cache_dir().ok(),
        _ => None,
    };
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "cvforge.log"));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let _guard = init_tracing(&config);
    info!(api = %config.api_base_url(), "cvforge starting");

    let mut app = App::new(config)?;
    match command {
        Command::Status => app.status().await,
        Command::Login(email) => app.login(email).await,
        Command::Register(email) => app.register(email).await,
        Command::Logout => app.logout().await,
        Command::Profile => app.show_profile().await,
        Command::ProfileSet(assignments) => app.update_profile(&assignments).await,
        Command::ForgotPassword(email) => app.forgot_password(email).await,
        Command::ResetPassword(token) => app.reset_password(&token).await,
        Command::Help => Ok(()),
    }
}
