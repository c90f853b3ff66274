//! In-memory `AuthApi` used by the session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use super::{AccessToken, CredentialStore};
use crate::api::{ApiError, AuthApi};
use crate::models::{AuthPayload, Identity, Profile, ProfileUpdate};

pub(crate) fn identity(id: i64) -> Identity {
    Identity {
        id,
        email: format!("user{}@example.com", id),
        plan: "FREE".to_string(),
    }
}

pub(crate) fn profile(id: i64, name: &str) -> Profile {
    Profile {
        id,
        email: format!("user{}@example.com", id),
        plan: "FREE".to_string(),
        name: Some(name.to_string()),
        headline: None,
        phone: None,
        location: None,
        linkedin: None,
        github: None,
        portfolio: None,
    }
}

#[derive(Default)]
pub(crate) struct Calls {
    pub login: AtomicUsize,
    pub refresh: AtomicUsize,
    pub profile: AtomicUsize,
    pub update: AtomicUsize,
    pub logout: AtomicUsize,
    pub forget: AtomicUsize,
}

/// Scripted account service. `None` responses fail.
#[derive(Default)]
pub(crate) struct FakeApi {
    /// Token handed out by `/auth/refresh`; `None` means no refresh cookie
    pub refresh_token: Option<&'static str>,
    /// Held back until notified, to interleave other operations
    pub refresh_gate: Option<Arc<Notify>>,
    /// Body of `/auth/login` and `/auth/register`; `None` means bad credentials
    pub login_payload: Option<serde_json::Value>,
    /// Answer of `GET /profile/me`; `None` means a server error
    pub profile: Option<Profile>,
    /// Canonical echo of `PUT /profile/me`; `None` means a validation failure
    pub echo: Option<Profile>,
    pub logout_fails: bool,
    /// When set, profile requests sent without a bearer token are refused
    pub store: Option<CredentialStore>,
    pub calls: Calls,
}

impl FakeApi {
    pub fn with_store(store: &CredentialStore) -> Self {
        Self {
            store: Some(store.clone()),
            ..Self::default()
        }
    }

    fn check_bearer(&self) -> Result<(), ApiError> {
        match self.store {
            Some(ref store) if store.access_token().is_none() => Err(ApiError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn credential_exchange(&self) -> Result<AuthPayload, ApiError> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        match self.login_payload {
            Some(ref value) => Ok(AuthPayload::from_value(value)),
            None => Err(ApiError::Business {
                status: 401,
                message: "Invalid credentials".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn login(&self, _email: &str, _password: &SecretString) -> Result<AuthPayload, ApiError> {
        tokio::task::yield_now().await;
        self.credential_exchange()
    }

    async fn register(&self, _email: &str, _password: &SecretString) -> Result<AuthPayload, ApiError> {
        tokio::task::yield_now().await;
        self.credential_exchange()
    }

    async fn refresh(&self) -> Result<AccessToken, ApiError> {
        self.calls.refresh.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(ref gate) = self.refresh_gate {
            gate.notified().await;
        }
        self.refresh_token
            .map(AccessToken::new)
            .ok_or(ApiError::Unauthorized)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.calls.logout.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.logout_fails {
            return Err(ApiError::ServerError("connection reset".to_string()));
        }
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        self.calls.profile.fetch_add(1, Ordering::SeqCst);
        self.check_bearer()?;
        tokio::task::yield_now().await;
        self.profile
            .clone()
            .ok_or_else(|| ApiError::ServerError("profile service down".to_string()))
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<Profile, ApiError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.check_bearer()?;
        tokio::task::yield_now().await;
        self.echo.clone().ok_or_else(|| {
            ApiError::Validation(
                [("name".to_string(), "must not be blank".to_string())]
                    .into_iter()
                    .collect(),
            )
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        Ok(Some(format!("Instructions sent to {}", email)))
    }

    async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        if reset_token == "expired" {
            return Err(ApiError::Business {
                status: 400,
                message: "Reset link expired".to_string(),
            });
        }
        if new_password.expose_secret().len() < 8 {
            return Err(ApiError::Validation(
                [("newPassword".to_string(), "too short".to_string())]
                    .into_iter()
                    .collect(),
            ));
        }
        Ok(Some("Password updated".to_string()))
    }

    fn forget_refresh_credential(&self) {
        self.calls.forget.fetch_add(1, Ordering::SeqCst);
    }
}
