//! Public entry points for signing in and out and for the profile.
//!
//! `SessionController` is created once at application start and handed to
//! whatever needs the session. It owns the [`Bootstrapper`] and shares the
//! [`CredentialStore`] with the [`ApiClient`](crate::api::ApiClient).
//!
//! Overlapping writes to the same field (two `update_profile` calls racing)
//! are not serialized here: the last response to arrive wins. Callers that
//! allow concurrent edits must serialize them themselves.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AccessToken, BootstrapOutcome, Bootstrapper, CredentialStore, Session};
use crate::api::{ApiClient, ApiError, AuthApi};
use crate::config::Config;
use crate::models::{Identity, Profile, ProfileUpdate};

pub struct SessionController {
    api: Arc<dyn AuthApi>,
    store: CredentialStore,
    bootstrapper: Bootstrapper,
}

impl SessionController {
    pub fn new(api: Arc<dyn AuthApi>, store: CredentialStore) -> Self {
        let bootstrapper = Bootstrapper::new(Arc::clone(&api), store.clone());
        Self {
            api,
            store,
            bootstrapper,
        }
    }

    /// Wire a fresh store to an [`ApiClient`] built from `config`.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let store = CredentialStore::new();
        let api = ApiClient::new(config, store.clone())?;
        Ok(Self::new(Arc::new(api), store))
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.store.subscribe()
    }

    /// Restore the session from the refresh cookie. Never fails; concurrent
    /// calls share one attempt.
    pub async fn check_auth(&self) -> BootstrapOutcome {
        self.bootstrapper.check_auth().await
    }

    /// Exchange email and password for a session.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, ApiError> {
        let payload = self.api.login(email, password).await?;
        let (identity, token) = payload.into_parts().ok_or_else(|| {
            ApiError::InvalidResponse("Login response is missing the token or user".to_string())
        })?;
        self.establish(identity.clone(), AccessToken::new(token)).await;
        Ok(identity)
    }

    /// Create an account and sign in with it.
    ///
    /// When the response does not carry both a token and a complete user, the
    /// session is restored through the refresh cookie instead. Returns the
    /// signed-in identity, or `None` if that restore came back anonymous.
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<Identity>, ApiError> {
        let payload = self.api.register(email, password).await?;
        match payload.into_parts() {
            Some((identity, token)) => {
                self.establish(identity.clone(), AccessToken::new(token)).await;
                Ok(Some(identity))
            }
            None => {
                debug!("Registration response incomplete, restoring from refresh cookie");
                self.check_auth().await;
                Ok(self.store.snapshot().auth_user().cloned())
            }
        }
    }

    /// Install a credential obtained from a successful exchange, then load the
    /// profile. A failed profile load leaves the session signed in without a
    /// profile.
    pub async fn establish(&self, identity: Identity, token: AccessToken) {
        let user_id = identity.id;
        let epoch = self.store.set_authenticated(identity, token);
        info!(user_id, "Signed in");

        match self.api.fetch_profile().await {
            Ok(profile) => {
                self.store.set_profile_if(epoch, profile);
            }
            Err(e) => warn!(user_id, error = %e, "Signed in but the profile could not be loaded"),
        }
    }

    /// Reload the profile from the server.
    pub async fn refresh_profile(&self) -> Result<Profile, ApiError> {
        let epoch = self.store.epoch();
        let profile = self.api.fetch_profile().await?;
        self.store.set_profile_if(epoch, profile.clone());
        Ok(profile)
    }

    /// Save profile edits. The stored profile becomes whatever the server
    /// echoes back; nothing is written locally before it answers.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let epoch = self.store.epoch();
        let profile = self.api.update_profile(update).await?;
        self.store.set_profile_if(epoch, profile.clone());
        debug!(user_id = profile.id, "Profile saved");
        Ok(profile)
    }

    /// End the session on this device. The server is told first, but the
    /// local session is cleared whether or not it answers.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.api.forget_refresh_credential();
        self.store.clear();
        info!("Signed out");
    }

    /// Ask for a password reset link. Returns the server's acknowledgement.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        self.api.forgot_password(email).await
    }

    /// Set a new password using the token from a reset link.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        self.api.reset_password(reset_token, new_password).await
    }
}
