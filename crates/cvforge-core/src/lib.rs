//! cvforge core: client-side session management for the cvforge account
//! service.
//!
//! Build one [`SessionController`] at startup, call
//! [`SessionController::check_auth`] to restore a previous sign-in from the
//! refresh cookie, and read or observe the [`Session`] through its
//! [`CredentialStore`]. Every request made through [`ApiClient`] carries the
//! token the store holds at that moment.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthApi, ErrorKind, FieldErrors};
pub use auth::{AccessToken, BootstrapOutcome, CredentialStore, Session, SessionController};
pub use config::Config;
pub use models::{Identity, Profile, ProfileUpdate};
