use chrono::{DateTime, Utc};

use super::AccessToken;
use crate::models::{Identity, Profile};

/// Client-side view of the current sign-in.
///
/// Only [`CredentialStore`](super::CredentialStore) mutates a `Session`, and it
/// always does so in a single step, so `is_authenticated` is true exactly when
/// both the access token and the identity are present.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) access_token: Option<AccessToken>,
    pub(crate) auth_user: Option<Identity>,
    pub(crate) profile: Option<Profile>,
    pub(crate) is_authenticated: bool,
    pub(crate) is_loading: bool,
    pub(crate) authenticated_at: Option<DateTime<Utc>>,
    pub(crate) epoch: u64,
}

impl Session {
    /// The state at application start: empty and loading until the bootstrap
    /// settles.
    pub fn new() -> Self {
        Self {
            access_token: None,
            auth_user: None,
            profile: None,
            is_authenticated: false,
            is_loading: true,
            authenticated_at: None,
            epoch: 0,
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn auth_user(&self) -> Option<&Identity> {
        self.auth_user.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }

    /// Generation counter; advances whenever the session is cleared or a new
    /// sign-in replaces it.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the user ID if signed in
    pub fn user_id(&self) -> Option<i64> {
        self.auth_user.as_ref().map(|u| u.id)
    }

    /// Check the authentication invariant
    pub fn is_consistent(&self) -> bool {
        self.is_authenticated == (self.access_token.is_some() && self.auth_user.is_some())
    }

    pub(crate) fn reset(&mut self) {
        self.access_token = None;
        self.auth_user = None;
        self.profile = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.authenticated_at = None;
        self.epoch += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
