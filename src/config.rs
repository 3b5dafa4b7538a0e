use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_AUTH_SCHEME: &str = "Bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an http(s) URL (got '{value}')")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} cannot be empty")]
    Empty { name: &'static str },
}

/// Connection settings for the messaging backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub auth_scheme: String,
}

impl Config {
    /// Reads `MESSAGING_API_BASE_URL`, `MESSAGING_API_TOKEN` and
    /// `MESSAGING_AUTH_SCHEME` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("MESSAGING_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                name: "MESSAGING_API_BASE_URL",
                value: api_base_url,
            });
        }

        let api_token = lookup("MESSAGING_API_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let auth_scheme = match lookup("MESSAGING_AUTH_SCHEME") {
            Some(s) if s.trim().is_empty() => {
                return Err(ConfigError::Empty { name: "MESSAGING_AUTH_SCHEME" })
            }
            Some(s) => s.trim().to_string(),
            None => DEFAULT_AUTH_SCHEME.to_string(),
        };

        Ok(Self { api_base_url, api_token, auth_scheme })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            api_token: None,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
        }
    }
}
