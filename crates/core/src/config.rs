//! Configuration shared across crates.

use serde::{Deserialize, Serialize};
use time::Duration;

/// Security settings consumed at initialization.
///
/// Immutable after construction: build one instance during startup and pass
/// it to the parser, repositories, and controller. Tests that need different
/// settings construct their own instance rather than mutating a shared one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Shared secret configured on the queue (required).
    pub secret_key: String,
    /// Query-string prefix for the token parameters, if the host site's own
    /// parameters collide with the defaults.
    #[serde(default)]
    pub query_string_prefix: Option<String>,
    /// How long a known-user URL is valid after it was issued, in seconds.
    /// When unset, token age is not checked.
    #[serde(default)]
    pub ticket_expiration_secs: Option<u64>,
    /// Domain scope of the validation cookie (e.g. ".ticketania.com").
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// How long a validated visitor may stay on the site before being sent
    /// back to the queue. Extended on every read while `extend_validity` is
    /// set.
    #[serde(default = "default_cookie_expiration_secs")]
    pub cookie_expiration_secs: u64,
    /// Expiration used instead of `cookie_expiration_secs` when the queue is
    /// in idle mode. Never extended.
    #[serde(default = "default_idle_expiration_secs")]
    pub idle_expiration_secs: u64,
    /// Expiration used instead of `cookie_expiration_secs` when the queue is
    /// disabled. Never extended.
    #[serde(default = "default_disabled_expiration_secs")]
    pub disabled_expiration_secs: u64,
    /// Whether validation extends the stored expiration on every read
    /// (sliding expiration). Default: true.
    #[serde(default = "default_extend_validity")]
    pub extend_validity: bool,
}

fn default_cookie_expiration_secs() -> u64 {
    1200 // 20 minutes
}

fn default_idle_expiration_secs() -> u64 {
    180 // 3 minutes
}

fn default_disabled_expiration_secs() -> u64 {
    180 // 3 minutes
}

fn default_extend_validity() -> bool {
    true
}

impl SecuritySettings {
    /// Create settings with default policy values for a given secret.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            query_string_prefix: None,
            ticket_expiration_secs: None,
            cookie_domain: None,
            cookie_expiration_secs: default_cookie_expiration_secs(),
            idle_expiration_secs: default_idle_expiration_secs(),
            disabled_expiration_secs: default_disabled_expiration_secs(),
            extend_validity: default_extend_validity(),
        }
    }

    /// Create settings for tests: fixed secret, defaults otherwise.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self::new("zaqxswcdevfrbgtnhymjukiloZAQCDEFRBGTNHYMJUKILOPlkjhgfdsapoiuytrewqmnbvcx")
    }

    /// Validate settings invariants.
    pub fn validate(&self) -> crate::Result<()> {
        if self.secret_key.is_empty() {
            return Err(crate::Error::InvalidSettings(
                "secret_key must not be empty".to_string(),
            ));
        }
        if self.ticket_expiration_secs > Some(i64::MAX as u64) {
            return Err(crate::Error::InvalidSettings(format!(
                "ticket_expiration_secs {} would overflow Duration",
                self.ticket_expiration_secs.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// The query-string prefix, or the empty string when unset.
    pub fn prefix(&self) -> &str {
        self.query_string_prefix.as_deref().unwrap_or("")
    }

    /// Ticket expiration as a Duration, if configured.
    pub fn ticket_expiration(&self) -> Option<Duration> {
        self.ticket_expiration_secs
            .map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
    }

    /// Cookie expiration as a Duration.
    pub fn cookie_expiration(&self) -> Duration {
        Duration::seconds(i64::try_from(self.cookie_expiration_secs).unwrap_or(i64::MAX))
    }

    /// Idle-mode expiration as a Duration.
    pub fn idle_expiration(&self) -> Duration {
        Duration::seconds(i64::try_from(self.idle_expiration_secs).unwrap_or(i64::MAX))
    }

    /// Disabled-mode expiration as a Duration.
    pub fn disabled_expiration(&self) -> Duration {
        Duration::seconds(i64::try_from(self.disabled_expiration_secs).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SecuritySettings::new("secret");
        assert_eq!(settings.cookie_expiration(), Duration::minutes(20));
        assert_eq!(settings.idle_expiration(), Duration::minutes(3));
        assert_eq!(settings.disabled_expiration(), Duration::minutes(3));
        assert!(settings.extend_validity);
        assert_eq!(settings.ticket_expiration(), None);
        assert_eq!(settings.prefix(), "");
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        assert!(SecuritySettings::new("").validate().is_err());
        assert!(SecuritySettings::for_testing().validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"secret_key":"acb","query_string_prefix":"pre"}"#;
        let settings: SecuritySettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.secret_key, "acb");
        assert_eq!(settings.prefix(), "pre");
        assert_eq!(settings.cookie_expiration_secs, 1200);
        assert!(settings.extend_validity);
    }
}
