//! REST API access for the cvforge account service.
//!
//! This module provides:
//! - `AuthApi`: the operations the session layer needs from the service
//! - `ApiClient`: the reqwest implementation, which attaches the current
//!   bearer token to every request it sends
//! - `KeychainCookieJar`: the cookie provider carrying the refresh credential
//! - `ApiError`: failures classified as validation, business or transport

pub mod client;
pub mod cookies;
pub mod error;

use async_trait::async_trait;
use secrecy::SecretString;

pub use client::ApiClient;
pub use cookies::KeychainCookieJar;
pub use error::{ApiError, ErrorKind, FieldErrors};

use crate::auth::AccessToken;
use crate::models::{AuthPayload, Profile, ProfileUpdate};

/// Remote operations used by the session layer.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &SecretString) -> Result<AuthPayload, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, email: &str, password: &SecretString) -> Result<AuthPayload, ApiError>;

    /// `POST /auth/refresh`, authenticated by the refresh cookie only
    async fn refresh(&self) -> Result<AccessToken, ApiError>;

    /// `POST /auth/logout`
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /profile/me`
    async fn fetch_profile(&self) -> Result<Profile, ApiError>;

    /// `PUT /profile/me`, returning the server's canonical profile
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError>;

    /// `POST /auth/forgot-password`
    async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError>;

    /// `POST /auth/reset-password`
    async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &SecretString,
    ) -> Result<Option<String>, ApiError>;

    /// Drop the refresh credential held by the transport, if any.
    fn forget_refresh_credential(&self) {}
}
