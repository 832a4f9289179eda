use serde::{Deserialize, Serialize};

/// Administrator tier.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Standard tier.
pub const ROLE_USER: &str = "ROLE_USER";

/// The persisted unit of authentication state.
///
/// Only `token` decides whether a user is authenticated. The profile fields are
/// display data and may be empty depending on how the session was acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    #[serde(default)]
    pub username: String,
    /// Open set; unknown values are kept verbatim.
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionRecord {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            role: role.into(),
            name: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_profile(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.name = name;
        self.email = email;
        self
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 || !token.is_char_boundary(12) {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_fields_deserialize_as_empty() {
        let record: SessionRecord = serde_json::from_str(r#"{"token":"abc123"}"#).unwrap();

        assert_eq!(record.token, "abc123");
        assert_eq!(record.username, "");
        assert_eq!(record.role, "");
        assert!(record.name.is_none());
        assert!(record.email.is_none());
        assert!(record.has_token());
    }

    #[test]
    fn test_admin_tier_detection() {
        assert!(SessionRecord::new("t", "admin", ROLE_ADMIN).is_admin());
        assert!(!SessionRecord::new("t", "user", ROLE_USER).is_admin());
        assert!(!SessionRecord::new("t", "x", "ROLE_AUDITOR").is_admin());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let record = SessionRecord::new("t", "alice", ROLE_USER);
        assert_eq!(record.display_name(), "alice");

        let record = record.with_profile(Some("Alice Smith".to_string()), None);
        assert_eq!(record.display_name(), "Alice Smith");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI...");
        assert_eq!(mask_token("short"), "***");
    }
}
