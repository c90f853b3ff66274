//! Cookie jar for the durable refresh credential.
//!
//! The account service hands out its refresh token as an HTTP-only cookie.
//! `KeychainCookieJar` is the reqwest cookie provider: it behaves like the
//! stock `Jar` and, when backed by the OS keychain, also records every
//! `Set-Cookie` it receives so the next process can bootstrap silently.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock};

use keyring::Entry;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SERVICE_NAME: &str = "cvforge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SavedCookie {
    url: String,
    set_cookie: String,
}

pub struct KeychainCookieJar {
    jar: RwLock<Jar>,
    saved: Mutex<BTreeMap<String, SavedCookie>>,
    entry: Option<Entry>,
}

/// Cookie name of a `Set-Cookie` header value
fn cookie_name(set_cookie: &str) -> Option<&str> {
    let (name, _) = set_cookie.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

impl KeychainCookieJar {
    /// Jar that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            jar: RwLock::new(Jar::default()),
            saved: Mutex::new(BTreeMap::new()),
            entry: None,
        }
    }

    /// Jar mirrored into the OS keychain under an account derived from the
    /// API base URL. Previously saved cookies are replayed into the jar.
    pub fn load(base_url: &str) -> Self {
        let account = format!("refresh-cookies:{}", base_url);
        let entry = match Entry::new(SERVICE_NAME, &account) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Keychain unavailable, refresh cookie will not persist");
                return Self::in_memory();
            }
        };

        let saved = match entry.get_password() {
            Ok(json) => serde_json::from_str::<Vec<SavedCookie>>(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable saved cookies");
                Vec::new()
            }),
            Err(keyring::Error::NoEntry) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read saved cookies from keychain");
                Vec::new()
            }
        };

        let jar = Jar::default();
        let mut by_name = BTreeMap::new();
        for cookie in saved {
            let Ok(url) = Url::parse(&cookie.url) else {
                continue;
            };
            let Some(name) = cookie_name(&cookie.set_cookie).map(str::to_string) else {
                continue;
            };
            jar.add_cookie_str(&cookie.set_cookie, &url);
            by_name.insert(name, cookie);
        }
        debug!(count = by_name.len(), "Restored saved cookies");

        Self {
            jar: RwLock::new(jar),
            saved: Mutex::new(by_name),
            entry: Some(entry),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.entry.is_some()
    }

    /// Drop every cookie, in memory and in the keychain
    pub fn forget(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        if let Some(ref entry) = self.entry {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => warn!(error = %e, "Failed to delete saved cookies from keychain"),
            }
        }
    }

    fn persist(&self, saved: &BTreeMap<String, SavedCookie>) {
        let Some(ref entry) = self.entry else {
            return;
        };
        let cookies: Vec<&SavedCookie> = saved.values().collect();
        let result = serde_json::to_string(&cookies)
            .map_err(|e| e.to_string())
            .and_then(|json| entry.set_password(&json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(error = %e, "Failed to save cookies to keychain");
        }
    }
}

impl CookieStore for KeychainCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(&mut headers.iter().copied(), url);

        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        for header in headers {
            let Ok(set_cookie) = header.to_str() else {
                continue;
            };
            if let Some(name) = cookie_name(set_cookie) {
                saved.insert(
                    name.to_string(),
                    SavedCookie {
                        url: url.to_string(),
                        set_cookie: set_cookie.to_string(),
                    },
                );
            }
        }
        self.persist(&saved);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}
