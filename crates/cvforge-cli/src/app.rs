//! Command handlers for the `cvforge` binary.
//!
//! `App` plays the part of the user interface: it restores the session,
//! calls the controller, and prints state and errors. Each run is a new
//! process, so commands that need a signed-in user start with `check_auth`.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use cvforge_core::{BootstrapOutcome, Config, ProfileUpdate, Session, SessionController};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::render;

pub struct App {
    config: Config,
    controller: SessionController,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let controller =
            SessionController::from_config(&config).context("Failed to create API client")?;
        Self::watch_session(controller.subscribe());
        Ok(Self { config, controller })
    }

    /// Log every session transition, the way a UI would re-render on them.
    fn watch_session(mut rx: watch::Receiver<Session>) {
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let summary = render::session_summary(&rx.borrow_and_update());
                debug!(%summary, "Session changed");
            }
        });
    }

    async fn require_session(&self) -> Result<()> {
        match self.controller.check_auth().await {
            BootstrapOutcome::Authenticated => Ok(()),
            _ => bail!("Not signed in. Run `cvforge login` first."),
        }
    }

    pub async fn status(&self) -> Result<()> {
        self.controller.check_auth().await;
        println!("{}", render::session_summary(&self.controller.store().snapshot()));
        Ok(())
    }

    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_email(self.config.last_email.as_deref())?,
        };
        let password = prompt_password("Password: ")?;

        println!("Signing in...");
        if let Err(e) = self.controller.login(&email, &password).await {
            bail!(render::describe_error(&e, "Login failed"));
        }

        self.remember_email(email);
        println!("{}", render::session_summary(&self.controller.store().snapshot()));
        Ok(())
    }

    pub async fn register(&mut self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_email(None)?,
        };
        let password = prompt_new_password()?;

        println!("Creating account...");
        match self.controller.register(&email, &password).await {
            Ok(Some(_)) => {
                self.remember_email(email);
                println!("{}", render::session_summary(&self.controller.store().snapshot()));
                Ok(())
            }
            Ok(None) => {
                self.remember_email(email);
                println!("Account created. Sign in with `cvforge login`.");
                Ok(())
            }
            Err(e) => bail!(render::describe_error(&e, "Could not create the account")),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        // Restore first so the server sees who is leaving
        self.controller.check_auth().await;
        self.controller.logout().await;
        println!("Signed out");
        Ok(())
    }

    pub async fn show_profile(&self) -> Result<()> {
        self.require_session().await?;

        let snapshot = self.controller.store().snapshot();
        let profile = match snapshot.profile() {
            Some(profile) => profile.clone(),
            None => match self.controller.refresh_profile().await {
                Ok(profile) => profile,
                Err(e) => bail!(render::describe_error(&e, "Could not load the profile")),
            },
        };

        for line in render::profile_lines(&profile) {
            println!("{}", line);
        }
        Ok(())
    }

    /// Apply `field=value` assignments to the profile.
    pub async fn update_profile(&self, assignments: &[String]) -> Result<()> {
        let update = parse_assignments(assignments)?;
        self.require_session().await?;

        match self.controller.update_profile(&update).await {
            Ok(profile) => {
                println!("Profile updated");
                for line in render::profile_lines(&profile) {
                    println!("{}", line);
                }
                Ok(())
            }
            Err(e) => bail!(render::describe_error(&e, "Could not update the profile")),
        }
    }

    pub async fn forgot_password(&self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_email(self.config.last_email.as_deref())?,
        };
        match self.controller.forgot_password(&email).await {
            Ok(message) => {
                println!("{}", message.as_deref().unwrap_or("Reset instructions sent"));
                Ok(())
            }
            Err(e) => bail!(render::describe_error(&e, "Could not send reset instructions")),
        }
    }

    pub async fn reset_password(&self, reset_token: &str) -> Result<()> {
        let password = prompt_new_password()?;
        match self.controller.reset_password(reset_token, &password).await {
            Ok(message) => {
                println!("{}", message.as_deref().unwrap_or("Password updated"));
                Ok(())
            }
            Err(e) => bail!(render::describe_error(&e, "Could not reset the password")),
        }
    }

    fn remember_email(&mut self, email: String) {
        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

fn parse_assignments(assignments: &[String]) -> Result<ProfileUpdate> {
    let mut update = ProfileUpdate::default();
    for assignment in assignments {
        let (field, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected field=value, got `{}`", assignment))?;
        if !update.set_field(field.trim(), value.trim()) {
            bail!(
                "Unknown profile field `{}` (expected one of: {})",
                field,
                ProfileUpdate::FIELDS.join(", ")
            );
        }
    }
    if update.is_empty() {
        bail!("Nothing to update");
    }
    Ok(update)
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        (true, None) => bail!("Email required"),
        (false, _) => Ok(input.to_string()),
    }
}

fn prompt_password(prompt: &str) -> Result<SecretString> {
    let password = rpassword::prompt_password(prompt)?;
    if password.is_empty() {
        bail!("Password required");
    }
    Ok(SecretString::from(password))
}

fn prompt_new_password() -> Result<SecretString> {
    let password = prompt_password("New password: ")?;
    let confirm = prompt_password("Confirm password: ")?;
    if password.expose_secret() != confirm.expose_secret() {
        bail!("Passwords do not match");
    }
    Ok(password)
}
