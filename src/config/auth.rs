//! Basic authorizer credentials.

use serde::Deserialize;

/// Credentials the basic authorizer compares against.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// How long the caller may cache a decision. Zero disables caching so
    /// credential changes take effect immediately.
    pub result_ttl_secs: u32,
}

impl AuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            result_ttl_secs: 0,
        }
    }

    /// Both halves of the credential must be set for any request to pass.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("result_ttl_secs", &self.result_ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = AuthConfig::new("admin", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_is_configured() {
        assert!(AuthConfig::new("u", "p").is_configured());
        assert!(!AuthConfig::new("u", "").is_configured());
        assert!(!AuthConfig::default().is_configured());
    }
}
