//! Config - 環境変数から組み立てる明示的な設定
//!
//! 起動時に一度だけ読み、参照で各コンポーネントに渡します。
//! グローバル状態は持ちません。

use std::time::Duration;

use thiserror::Error;

pub const ENV_MONGODB_URI: &str = "IMGVAULT_MONGODB_URI";
pub const ENV_DATABASE: &str = "IMGVAULT_DATABASE";
pub const ENV_COLLECTION: &str = "IMGVAULT_COLLECTION";
pub const ENV_API_TOKEN: &str = "IMGVAULT_API_TOKEN";
pub const ENV_API_ACCEPT: &str = "IMGVAULT_API_ACCEPT";

/// Versioned media type the control-plane API expects.
pub const DEFAULT_API_ACCEPT: &str = "application/vnd.atlas.2024-07-18+json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is empty")]
    Empty { name: &'static str },
}

/// Where images are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (tests, alternate sources).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup(ENV_MONGODB_URI).ok_or(ConfigError::Missing(ENV_MONGODB_URI))?;
        if uri.trim().is_empty() {
            return Err(ConfigError::Empty {
                name: ENV_MONGODB_URI,
            });
        }
        Ok(Self {
            uri,
            database: non_empty(lookup(ENV_DATABASE)).unwrap_or_else(|| "imgvault".to_string()),
            collection: non_empty(lookup(ENV_COLLECTION)).unwrap_or_else(|| "images".to_string()),
        })
    }
}

/// How to talk to the control-plane API when polling.
#[derive(Clone, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    pub token: Option<String>,
    pub accept: String,
    pub request_timeout: Duration,
}

impl ControlPlaneConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            token: non_empty(lookup(ENV_API_TOKEN)),
            accept: non_empty(lookup(ENV_API_ACCEPT))
                .unwrap_or_else(|| DEFAULT_API_ACCEPT.to_string()),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// トークンをログに出さない
impl std::fmt::Debug for ControlPlaneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("accept", &self.accept)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
