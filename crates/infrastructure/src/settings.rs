//! Transport settings
//!
//! Settings of the reqwest transport, with defaults and environment
//! overrides (`CONDUIT_*` variables).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable holding the base URL.
pub const BASE_URL_VAR: &str = "CONDUIT_BASE_URL";
/// Environment variable holding the user agent.
pub const USER_AGENT_VAR: &str = "CONDUIT_USER_AGENT";
/// Environment variable holding the connect timeout in milliseconds.
pub const CONNECT_TIMEOUT_VAR: &str = "CONDUIT_CONNECT_TIMEOUT_MS";
/// Environment variable holding the redirect limit.
pub const MAX_REDIRECTS_VAR: &str = "CONDUIT_MAX_REDIRECTS";

/// Errors while reading settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The base URL is not an absolute URL.
    #[error("invalid base URL {value}: {message}")]
    InvalidBaseUrl {
        /// The rejected value.
        value: String,
        /// Parser message.
        message: String,
    },

    /// A numeric variable could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Settings of [`ReqwestTransport`](crate::ReqwestTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Base URL relative endpoint URLs are joined onto.
    pub base_url: Option<Url>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: concat!("Conduit/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_ms: 30_000,
            max_redirects: 10,
        }
    }
}

impl TransportSettings {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reads settings from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, called with each variable name.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = var(BASE_URL_VAR) {
            let url = Url::parse(value.trim()).map_err(|e| SettingsError::InvalidBaseUrl {
                message: e.to_string(),
                value,
            })?;
            settings.base_url = Some(url);
        }
        if let Some(value) = var(USER_AGENT_VAR) {
            settings.user_agent = value;
        }
        if let Some(value) = var(CONNECT_TIMEOUT_VAR) {
            settings.connect_timeout_ms = parse_number(CONNECT_TIMEOUT_VAR, value)?;
        }
        if let Some(value) = var(MAX_REDIRECTS_VAR) {
            settings.max_redirects = parse_number(MAX_REDIRECTS_VAR, value)?;
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidNumber { name, value })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = TransportSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, TransportSettings::default());
        assert_eq!(settings.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_reads_all_variables() {
        let settings = TransportSettings::from_lookup(lookup(&[
            (BASE_URL_VAR, "https://api.example.com/v1/"),
            (USER_AGENT_VAR, "tests"),
            (CONNECT_TIMEOUT_VAR, "1500"),
            (MAX_REDIRECTS_VAR, "0"),
        ]))
        .unwrap();

        assert_eq!(
            settings.base_url.as_ref().map(Url::as_str),
            Some("https://api.example.com/v1/")
        );
        assert_eq!(settings.user_agent, "tests");
        assert_eq!(settings.connect_timeout_ms, 1500);
        assert_eq!(settings.max_redirects, 0);
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let settings = TransportSettings::from_lookup(lookup(&[(USER_AGENT_VAR, "  ")])).unwrap();
        assert_eq!(settings.user_agent, TransportSettings::default().user_agent);
    }

    #[test]
    fn test_invalid_values() {
        let error = TransportSettings::from_lookup(lookup(&[(CONNECT_TIMEOUT_VAR, "soon")]))
            .unwrap_err();
        assert_eq!(
            error,
            SettingsError::InvalidNumber {
                name: CONNECT_TIMEOUT_VAR,
                value: "soon".to_string(),
            }
        );

        let error =
            TransportSettings::from_lookup(lookup(&[(BASE_URL_VAR, "/relative")])).unwrap_err();
        assert!(matches!(error, SettingsError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: TransportSettings =
            serde_json::from_str(r#"{"max_redirects": 3}"#).unwrap();
        assert_eq!(settings.max_redirects, 3);
        assert_eq!(settings.connect_timeout_ms, 30_000);
    }
}
