//! Text output for sessions, profiles and errors.
//!
//! The core hands back classified errors; turning them into something a
//! person reads, including the generic fallback for transport failures, is
//! done here.

use cvforge_core::{ApiError, ErrorKind, Profile, Session};

/// Lines describing a failed operation. `fallback` is shown when the server
/// gave nothing more specific.
pub fn error_lines(err: &ApiError, fallback: &str) -> Vec<String> {
    match err.kind() {
        ErrorKind::Validation => err
            .field_errors()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect()
            })
            .unwrap_or_else(|| vec![fallback.to_string()]),
        ErrorKind::Business => vec![err.message().unwrap_or(fallback).to_string()],
        ErrorKind::Transport => vec![fallback.to_string()],
    }
}

pub fn describe_error(err: &ApiError, fallback: &str) -> String {
    error_lines(err, fallback).join("\n")
}

pub fn session_summary(session: &Session) -> String {
    if session.is_loading() {
        return "Checking session...".to_string();
    }
    match session.auth_user() {
        Some(user) if session.is_authenticated() => {
            let name = session
                .profile()
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| user.email.clone());
            let since = session
                .authenticated_at()
                .map(|at| format!(" since {}", at.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            format!("Signed in as {} ({} plan){}", name, user.plan, since)
        }
        _ => "Not signed in".to_string(),
    }
}

pub fn profile_lines(profile: &Profile) -> Vec<String> {
    let fields = [
        ("Name", profile.name.as_deref()),
        ("Email", Some(profile.email.as_str())),
        ("Plan", Some(profile.plan.as_str())),
        ("Headline", profile.headline.as_deref()),
        ("Phone", profile.phone.as_deref()),
        ("Location", profile.location.as_deref()),
        ("LinkedIn", profile.linkedin.as_deref()),
        ("GitHub", profile.github.as_deref()),
        ("Portfolio", profile.portfolio.as_deref()),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("{:<10} {}", label, value.unwrap_or("-")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_render_per_field() {
        let err = ApiError::Validation(
            [
                ("email".to_string(), "invalid".to_string()),
                ("password".to_string(), "too short".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(
            error_lines(&err, "Login failed"),
            vec!["email: invalid".to_string(), "password: too short".to_string()]
        );
    }

    #[test]
    fn test_business_error_uses_server_message() {
        let err = ApiError::Business {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(describe_error(&err, "Login failed"), "Invalid credentials");
    }

    #[test]
    fn test_transport_errors_use_fallback() {
        assert_eq!(describe_error(&ApiError::Unauthorized, "Login failed"), "Login failed");
        assert_eq!(
            describe_error(&ApiError::ServerError("stack trace".to_string()), "Could not save profile"),
            "Could not save profile"
        );
    }

    #[test]
    fn test_session_summary_states() {
        let store = cvforge_core::CredentialStore::new();
        assert_eq!(session_summary(&store.snapshot()), "Checking session...");

        store.clear();
        assert_eq!(session_summary(&store.snapshot()), "Not signed in");

        store.set_authenticated(
            cvforge_core::Identity {
                id: 1,
                email: "ada@example.com".to_string(),
                plan: "PRO".to_string(),
            },
            cvforge_core::AccessToken::new("t"),
        );
        let summary = session_summary(&store.snapshot());
        assert!(summary.starts_with("Signed in as ada@example.com (PRO plan) since "));
    }
}
