//! API client for the cvforge account service.
//!
//! `ApiClient` owns a pooled reqwest client and a handle to the
//! [`CredentialStore`]. Every request it builds goes through
//! [`ApiClient::auth_headers`], which reads the token held at that moment and
//! attaches it as a bearer header. There is no retry and no refresh on 401:
//! failures are returned to the caller as they come.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{ApiError, AuthApi, KeychainCookieJar};
use crate::auth::{AccessToken, CredentialStore};
use crate::config::Config;
use crate::models::{
    AuthPayload, Credentials, ForgotPasswordRequest, MessageResponse, Profile, ProfileUpdate,
    RefreshResponse, ResetPasswordRequest,
};

/// API client for the account service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
    cookies: Arc<KeychainCookieJar>,
}

impl ApiClient {
    /// Create a client reading its token from `store`.
    pub fn new(config: &Config, store: CredentialStore) -> Result<Self, ApiError> {
        let cookies = if config.remember_session {
            KeychainCookieJar::load(config.api_base_url())
        } else {
            KeychainCookieJar::in_memory()
        };
        Self::with_cookie_jar(config, store, Arc::new(cookies))
    }

    pub fn with_cookie_jar(
        config: &Config,
        store: CredentialStore,
        cookies: Arc<KeychainCookieJar>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url().to_string(),
            store,
            cookies,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers carrying the token currently held by the store, if any.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.store.access_token() {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token.expose()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(request.headers(self.auth_headers()?))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self.authorize(request)?.send().await?;
        Self::check_response(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    async fn exchange_credentials(
        &self,
        path: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthPayload, ApiError> {
        let body = Credentials {
            email,
            password: password.expose_secret(),
        };
        let value: serde_json::Value = self
            .send_json(self.client.post(self.url(path)).json(&body))
            .await?;
        Ok(AuthPayload::from_value(&value))
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    #[instrument(skip_all, fields(email = %email))]
    async fn login(&self, email: &str, password: &SecretString) -> Result<AuthPayload, ApiError> {
        self.exchange_credentials("/auth/login", email, password).await
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn register(&self, email: &str, password: &SecretString) -> Result<AuthPayload, ApiError> {
        self.exchange_credentials("/auth/register", email, password).await
    }

    async fn refresh(&self) -> Result<AccessToken, ApiError> {
        let response: RefreshResponse = self
            .send_json(self.client.post(self.url("/auth/refresh")))
            .await?;
        if response.access_token.is_empty() {
            return Err(ApiError::InvalidResponse("Refresh returned an empty token".to_string()));
        }
        Ok(AccessToken::new(response.access_token))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send(self.client.post(self.url("/auth/logout"))).await?;
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        self.send_json(self.client.get(self.url("/profile/me"))).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        self.send_json(self.client.put(self.url("/profile/me")).json(update))
            .await
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        let response: MessageResponse = self
            .send_json(
                self.client
                    .post(self.url("/auth/forgot-password"))
                    .json(&ForgotPasswordRequest { email }),
            )
            .await?;
        Ok(response.message)
    }

    async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        let body = ResetPasswordRequest {
            token: reset_token,
            new_password: new_password.expose_secret(),
        };
        let response: MessageResponse = self
            .send_json(self.client.post(self.url("/auth/reset-password")).json(&body))
            .await?;
        Ok(response.message)
    }

    fn forget_refresh_credential(&self) {
        self.cookies.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn client(store: CredentialStore) -> ApiClient {
        let config = Config {
            api_base_url: "http://localhost:8080/api/".to_string(),
            ..Config::default()
        };
        ApiClient::with_cookie_jar(&config, store, Arc::new(KeychainCookieJar::in_memory()))
            .expect("client should build")
    }

    fn build(api: &ApiClient, path: &str) -> reqwest::Request {
        api.authorize(api.client.get(api.url(path)))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = client(CredentialStore::new());
        assert_eq!(api.url("/profile/me"), "http://localhost:8080/api/profile/me");
    }

    #[test]
    fn test_no_token_sends_unauthenticated() {
        let api = client(CredentialStore::new());
        let request = build(&api, "/profile/me");
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_token_read_at_request_time() {
        let store = CredentialStore::new();
        let api = client(store.clone());

        store.set_authenticated(
            Identity { id: 1, email: "a@b.c".to_string(), plan: "FREE".to_string() },
            AccessToken::new("first"),
        );
        let request = build(&api, "/profile/me");
        let value = request.headers().get(header::AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer first");
        assert!(value.is_sensitive());

        // The same client picks up a replaced token and a cleared session
        store.set_authenticated(
            Identity { id: 1, email: "a@b.c".to_string(), plan: "FREE".to_string() },
            AccessToken::new("second"),
        );
        let request = build(&api, "/profile/me");
        assert_eq!(request.headers()[header::AUTHORIZATION].to_str().unwrap(), "Bearer second");

        store.clear();
        let request = build(&api, "/profile/me");
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_characters_rejected() {
        let store = CredentialStore::new();
        let api = client(store.clone());
        store.set_authenticated(
            Identity { id: 1, email: "a@b.c".to_string(), plan: "FREE".to_string() },
            AccessToken::new("bad\ntoken"),
        );
        assert!(matches!(api.auth_headers(), Err(ApiError::InvalidHeader(_))));
    }
}
