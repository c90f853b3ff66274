use serde::{Deserialize, Serialize};

/// Minimal record of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub plan: String,
}

/// The user-editable profile as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

impl Profile {
    /// The identity embedded in this profile.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            plan: self.plan.clone(),
        }
    }

    /// Name for display, falling back to the email address
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Fields sent with `PUT /profile/me`. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

impl ProfileUpdate {
    /// Names accepted by [`ProfileUpdate::set_field`].
    pub const FIELDS: [&'static str; 7] = [
        "name", "headline", "phone", "location", "linkedin", "github", "portfolio",
    ];

    /// Set a field by its wire name. Returns false for unknown fields.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        let slot = match field {
            "name" => &mut self.name,
            "headline" => &mut self.headline,
            "phone" => &mut self.phone,
            "location" => &mut self.location,
            "linkedin" => &mut self.linkedin,
            "github" => &mut self.github,
            "portfolio" => &mut self.portfolio,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_with_missing_optionals() {
        let json = r#"{"id": 7, "email": "ada@example.com", "plan": "FREE", "name": "Ada"}"#;
        let profile: Profile = serde_json::from_str(json).expect("Failed to parse profile JSON");

        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert!(profile.headline.is_none());
        assert!(profile.portfolio.is_none());
        assert_eq!(
            profile.identity(),
            Identity { id: 7, email: "ada@example.com".to_string(), plan: "FREE".to_string() }
        );
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut profile: Profile =
            serde_json::from_str(r#"{"id": 1, "email": "a@b.c", "plan": "PRO"}"#).unwrap();
        assert_eq!(profile.display_name(), "a@b.c");

        profile.name = Some("   ".to_string());
        assert_eq!(profile.display_name(), "a@b.c");

        profile.name = Some("Ada Lovelace".to_string());
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_update_serializes_only_set_fields() {
        let mut update = ProfileUpdate::default();
        assert!(update.is_empty());

        assert!(update.set_field("name", "Ada"));
        assert!(update.set_field("github", "https://github.com/ada"));
        assert!(!update.set_field("email", "other@example.com"));

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "Ada", "github": "https://github.com/ada"})
        );
    }
}
