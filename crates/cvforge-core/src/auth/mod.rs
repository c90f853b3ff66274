//! Session management: who is signed in and with which token.
//!
//! This module provides:
//! - `Session`: the current token, identity and profile
//! - `CredentialStore`: observable in-memory holder of the `Session`
//! - `Bootstrapper`: single-flight restore from the refresh cookie
//! - `SessionController`: login, registration, logout and profile operations
//!
//! Nothing here touches the disk; the session lives as long as the process.

pub mod bootstrap;
pub mod controller;
pub mod session;
pub mod store;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{BootstrapOutcome, Bootstrapper};
pub use controller::SessionController;
pub use session::Session;
pub use store::CredentialStore;
pub use token::AccessToken;
