//! Runtime Configuration
//!
//! Settings are read from the environment (optionally seeded from a
//! `.env` file) and may then be overridden from the command line.
//!
//! | Variable          | Default                     |
//! |-------------------|-----------------------------|
//! | `HOST`            | `0.0.0.0`                   |
//! | `PORT`            | `8000`                      |
//! | `STATIC_DIR`      | unset                       |
//! | `OPENAI_API_KEY`  | unset (heuristic generation)|
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL`    | `gpt-3.5-turbo`             |
//! | `AI_TIMEOUT_SECS` | `30`                        |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while reading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,

    /// Directory of frontend assets served at `/`, if any
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Returns the socket address to bind.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns true if the server listens on every interface.
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }
}

/// Language-model service settings.
#[derive(Clone, PartialEq)]
pub struct AiConfig {
    /// Service credential; generation is heuristic when absent
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    /// Upper bound on a single model request
    pub timeout: Duration,
}

impl AiConfig {
    /// Returns the credential if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_AI_TIMEOUT,
        }
    }
}

// The credential is never printed.
impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.credential().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub ai: AiConfig,
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(host) = lookup("HOST") {
            config.server.host = parse_var("HOST", &host)?;
        }
        if let Some(port) = lookup("PORT") {
            config.server.port = parse_var("PORT", &port)?;
        }
        config.server.static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        config.ai.api_key = lookup("OPENAI_API_KEY");
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.ai.base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.ai.model = model;
        }
        if let Some(timeout) = lookup("AI_TIMEOUT_SECS") {
            config.ai.timeout = Duration::from_secs(parse_var("AI_TIMEOUT_SECS", &timeout)?);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.server.port, 8000);
        assert!(config.server.binds_to_all_interfaces());
        assert!(config.ai.credential().is_none());
        assert_eq!(config.ai.model, DEFAULT_MODEL);
        assert_eq!(config.ai.timeout, DEFAULT_AI_TIMEOUT);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9090"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1"),
            ("AI_TIMEOUT_SECS", "5"),
            ("STATIC_DIR", "./public"),
        ]))
        .unwrap();

        assert_eq!(config.server.server_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.server.static_dir, Some(PathBuf::from("./public")));
        assert_eq!(config.ai.credential(), Some("sk-test"));
        assert_eq!(config.ai.base_url, "http://localhost:1234/v1");
        assert_eq!(config.ai.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(config.ai.credential().is_none());
    }

    #[test]
    fn test_debug_redacts_credential() {
        let mut ai = AiConfig::default();
        ai.api_key = Some("sk-secret".to_string());

        let printed = format!("{:?}", ai);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
