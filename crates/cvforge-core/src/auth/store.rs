//! In-memory store for the current [`Session`].
//!
//! The store wraps a `tokio::sync::watch` channel: every mutation replaces the
//! session under the channel's lock and wakes subscribers once, so observers
//! never see a half-applied change. Deferred results from network calls use
//! the `*_if` variants, which apply only while the session epoch captured at
//! call time is still current.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use super::{AccessToken, Session};
use crate::models::{Identity, Profile};

/// Shared handle to the session state. Clone is cheap.
#[derive(Clone)]
pub struct CredentialStore {
    state: Arc<watch::Sender<Session>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::new());
        Self {
            state: Arc::new(state),
        }
    }

    // ===== Reads =====

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// The token to attach to outgoing requests, if any
    pub fn access_token(&self) -> Option<AccessToken> {
        self.state.borrow().access_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    // ===== Unconditional mutations =====

    /// Record a fresh sign-in and return its epoch. Starting a new epoch
    /// discards deferred results from an earlier session. Does not fetch the
    /// profile.
    pub fn set_authenticated(&self, identity: Identity, token: AccessToken) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            s.epoch += 1;
            Self::authenticate(s, identity, token);
            epoch = s.epoch;
            debug!(user_id = ?s.user_id(), epoch, "Session authenticated");
        });
        epoch
    }

    /// Replace the stored profile
    pub fn set_profile(&self, profile: Profile) {
        self.state.send_modify(|s| s.profile = Some(profile));
    }

    /// Drop everything and advance the epoch
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            s.reset();
            debug!(epoch = s.epoch, "Session cleared");
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.is_loading != loading;
            s.is_loading = loading;
            changed
        });
    }

    // ===== Epoch-guarded mutations =====

    /// Mark the session as loading and return the epoch to guard the
    /// deferred result with.
    pub fn begin_loading(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            s.is_loading = true;
            epoch = s.epoch;
        });
        epoch
    }

    /// Hold a token before the identity is known, so follow-up requests can
    /// carry it.
    pub fn set_access_token_if(&self, epoch: u64, token: AccessToken) -> bool {
        self.apply_if(epoch, |s| s.access_token = Some(token))
    }

    /// Authenticate and store the profile in one step, without starting a new
    /// epoch.
    pub fn establish_if(
        &self,
        epoch: u64,
        identity: Identity,
        token: AccessToken,
        profile: Option<Profile>,
    ) -> bool {
        self.apply_if(epoch, |s| {
            Self::authenticate(s, identity, token);
            if profile.is_some() {
                s.profile = profile;
            }
        })
    }

    pub fn set_profile_if(&self, epoch: u64, profile: Profile) -> bool {
        self.apply_if(epoch, |s| s.profile = Some(profile))
    }

    pub fn clear_if(&self, epoch: u64) -> bool {
        self.apply_if(epoch, Session::reset)
    }

    fn apply_if(&self, epoch: u64, apply: impl FnOnce(&mut Session)) -> bool {
        let applied = self.state.send_if_modified(|s| {
            if s.epoch != epoch {
                return false;
            }
            apply(s);
            true
        });
        if !applied {
            debug!(stale_epoch = epoch, "Discarding stale session update");
        }
        applied
    }

    fn authenticate(s: &mut Session, identity: Identity, token: AccessToken) {
        // A profile belonging to another account must not survive a sign-in
        if s.profile.as_ref().is_some_and(|p| p.id != identity.id) {
            s.profile = None;
        }
        s.auth_user = Some(identity);
        s.access_token = Some(token);
        s.is_authenticated = true;
        s.is_loading = false;
        s.authenticated_at = Some(Utc::now());
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
