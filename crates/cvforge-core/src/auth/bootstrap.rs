//! Silent session restore at application start.
//!
//! [`Bootstrapper::check_auth`] trades the refresh cookie for an access token,
//! loads the profile with it and marks the session authenticated. Any failure
//! leaves the session anonymous without surfacing an error.
//!
//! Concurrent callers share a single attempt: the first caller parks a
//! `Shared` future in the flight slot and later callers await a clone of it,
//! so only one refresh request is ever in flight.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};

use super::CredentialStore;
use crate::api::{ApiError, AuthApi};

/// How a bootstrap attempt settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The refresh cookie was accepted and the session is authenticated.
    Authenticated,
    /// No usable refresh credential; the session was cleared.
    Anonymous,
    /// A logout or sign-in happened meanwhile and the result was discarded.
    Superseded,
}

type Flight = Shared<BoxFuture<'static, BootstrapOutcome>>;

#[derive(Default)]
struct FlightSlot {
    next_id: u64,
    current: Option<(u64, Flight)>,
}

pub struct Bootstrapper {
    api: Arc<dyn AuthApi>,
    store: CredentialStore,
    slot: Mutex<FlightSlot>,
}

impl Bootstrapper {
    pub fn new(api: Arc<dyn AuthApi>, store: CredentialStore) -> Self {
        Self {
            api,
            store,
            slot: Mutex::new(FlightSlot::default()),
        }
    }

    /// Restore the session from the refresh cookie, joining the attempt
    /// already in flight if there is one.
    pub async fn check_auth(&self) -> BootstrapOutcome {
        let (id, flight) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.current.clone() {
                Some((id, flight)) => {
                    debug!(flight = id, "Joining bootstrap in flight");
                    (id, flight)
                }
                None => {
                    slot.next_id += 1;
                    let id = slot.next_id;
                    let flight = Self::run(Arc::clone(&self.api), self.store.clone())
                        .boxed()
                        .shared();
                    slot.current = Some((id, flight.clone()));
                    (id, flight)
                }
            }
        };

        let outcome = flight.await;

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.current.as_ref().is_some_and(|(current, _)| *current == id) {
            slot.current = None;
        }
        outcome
    }

    /// True while an attempt is pending
    pub fn in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .is_some()
    }

    async fn run(api: Arc<dyn AuthApi>, store: CredentialStore) -> BootstrapOutcome {
        let epoch = store.begin_loading();
        match Self::restore(api.as_ref(), &store, epoch).await {
            Ok(true) => {
                info!(user_id = ?store.snapshot().user_id(), "Session restored");
                BootstrapOutcome::Authenticated
            }
            Ok(false) => BootstrapOutcome::Superseded,
            Err(e) => {
                debug!(error = %e, "No session to restore");
                if store.clear_if(epoch) {
                    BootstrapOutcome::Anonymous
                } else {
                    BootstrapOutcome::Superseded
                }
            }
        }
    }

    /// Returns `Ok(false)` when the epoch moved before the result could be
    /// applied.
    async fn restore(
        api: &dyn AuthApi,
        store: &CredentialStore,
        epoch: u64,
    ) -> Result<bool, ApiError> {
        let token = api.refresh().await?;
        // The profile request below picks the token up from the store
        if !store.set_access_token_if(epoch, token.clone()) {
            return Ok(false);
        }

        let profile = api.fetch_profile().await?;
        let identity = profile.identity();
        Ok(store.establish_if(epoch, identity, token, Some(profile)))
    }
}
