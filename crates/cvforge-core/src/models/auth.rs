//! Wire payloads for the `/auth/*` endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Identity;

/// Request body for `POST /auth/login` and `POST /auth/register`.
#[derive(Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    #[serde(rename = "newPassword")]
    pub new_password: &'a str,
}

/// Response from `POST /auth/refresh`.
#[derive(Deserialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Acknowledgement carrying a human-readable message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of a credential exchange (login or registration).
///
/// The server is not consistent about the shape: the token may be named
/// `accessToken` or `token`, and the user may sit under `user`, `profile`
/// or at the root of the object.
#[derive(Default)]
pub struct AuthPayload {
    pub access_token: Option<String>,
    pub user: Option<Identity>,
}

impl AuthPayload {
    pub fn from_value(value: &Value) -> Self {
        let access_token = ["accessToken", "token"]
            .iter()
            .filter_map(|key| value.get(*key))
            .find_map(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        let user_value = ["user", "profile"]
            .iter()
            .filter_map(|key| value.get(*key))
            .find(|v| !v.is_null())
            .unwrap_or(value);
        let user = Identity::deserialize(user_value).ok();

        Self { access_token, user }
    }

    /// Both halves of a usable session, if the payload carried them.
    pub fn into_parts(self) -> Option<(Identity, String)> {
        match (self.user, self.access_token) {
            (Some(user), Some(token)) => Some((user, token)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_payload_login_shape() {
        let value = json!({
            "accessToken": "abc",
            "user": {"id": 3, "email": "ada@example.com", "plan": "FREE"}
        });
        let (user, token) = AuthPayload::from_value(&value).into_parts().unwrap();
        assert_eq!(token, "abc");
        assert_eq!(user.id, 3);
        assert_eq!(user.plan, "FREE");
    }

    #[test]
    fn test_auth_payload_alternate_shapes() {
        // Token under `token`, user under `profile` with extra fields
        let value = json!({
            "token": "xyz",
            "user": null,
            "profile": {"id": 4, "email": "b@example.com", "plan": "PRO", "name": "B"}
        });
        let (user, token) = AuthPayload::from_value(&value).into_parts().unwrap();
        assert_eq!(token, "xyz");
        assert_eq!(user.email, "b@example.com");

        // User fields at the root
        let value = json!({"accessToken": "t", "id": 5, "email": "c@example.com", "plan": "FREE"});
        let (user, _) = AuthPayload::from_value(&value).into_parts().unwrap();
        assert_eq!(user.id, 5);
    }

    #[test]
    fn test_auth_payload_incomplete() {
        // Missing token
        let value = json!({"user": {"id": 1, "email": "a@b.c", "plan": "FREE"}});
        let payload = AuthPayload::from_value(&value);
        assert!(payload.user.is_some());
        assert!(payload.into_parts().is_none());

        // User missing the plan
        let value = json!({"accessToken": "t", "user": {"id": 1, "email": "a@b.c"}});
        let payload = AuthPayload::from_value(&value);
        assert!(payload.user.is_none());
        assert!(payload.into_parts().is_none());

        // Empty token is treated as absent
        let value = json!({"accessToken": "", "user": {"id": 1, "email": "a@b.c", "plan": "FREE"}});
        assert!(AuthPayload::from_value(&value).into_parts().is_none());
    }

    #[test]
    fn test_reset_password_request_wire_names() {
        let body = serde_json::to_value(ResetPasswordRequest { token: "r", new_password: "p" }).unwrap();
        assert_eq!(body, json!({"token": "r", "newPassword": "p"}));
    }
}
