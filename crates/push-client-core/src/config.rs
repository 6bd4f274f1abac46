use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub const DEFAULT_VAPID_KEY: &str = "BIcwRCI4mMf4kxYF0Ht_4f5m7x17zTnKiAkpezuHwGAoDd-bHAg8mWdZOaETjep7yhcqjclSDvVgInJ7-vz1Tl8";
pub const DEFAULT_SENT_FLAG_KEY: &str = "sentToServer";
pub const DEFAULT_MESSAGING_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_VAPID_KEY: &str = "PUSH_DEMO_VAPID_KEY";
pub const ENV_STORAGE_KEY: &str = "PUSH_DEMO_STORAGE_KEY";
pub const ENV_MESSAGING_TIMEOUT_MS: &str = "PUSH_DEMO_MESSAGING_TIMEOUT_MS";
pub const ENV_TOKEN_UPLOAD_URL: &str = "PUSH_DEMO_TOKEN_UPLOAD_URL";
pub const ENV_AUTO_REQUEST_PERMISSION: &str = "PUSH_DEMO_AUTO_REQUEST_PERMISSION";
pub const ENV_LOG_FILTER: &str = "PUSH_DEMO_LOG";

/// Uncompressed P-256 public point: 0x04 || X || Y.
const VAPID_PUBLIC_KEY_LEN: usize = 65;
const VAPID_UNCOMPRESSED_TAG: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("vapid key must not be empty")]
    EmptyVapidKey,
    #[error("vapid key must be url-safe base64")]
    VapidKeyEncoding,
    #[error("vapid key must decode to a {VAPID_PUBLIC_KEY_LEN}-byte uncompressed P-256 point")]
    VapidKeyShape,
    #[error("storage key must not be empty")]
    EmptyStorageKey,
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidInteger { key: &'static str, value: String },
    #[error("{key} must be a boolean flag, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },
    #[error("upload url must use http:// or https:// and include a host")]
    InvalidUploadUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushDemoConfig {
    pub vapid_key: String,
    pub sent_flag_key: String,
    /// `None` disables the deadline on messaging calls.
    pub messaging_timeout: Option<Duration>,
    pub token_upload_url: Option<String>,
    pub auto_request_permission: bool,
    pub log_filter: String,
}

impl Default for PushDemoConfig {
    fn default() -> Self {
        Self {
            vapid_key: DEFAULT_VAPID_KEY.to_string(),
            sent_flag_key: DEFAULT_SENT_FLAG_KEY.to_string(),
            messaging_timeout: Some(Duration::from_millis(DEFAULT_MESSAGING_TIMEOUT_MS)),
            token_upload_url: None,
            auto_request_permission: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PushDemoConfig {
    /// Resolves the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config from an arbitrary key lookup. Blank values count
    /// as unset and fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let vapid_key = match lookup(ENV_VAPID_KEY) {
            Some(raw) => normalize_vapid_key(&raw)?,
            None => defaults.vapid_key,
        };

        let sent_flag_key = lookup(ENV_STORAGE_KEY).unwrap_or(defaults.sent_flag_key);

        let messaging_timeout = match lookup(ENV_MESSAGING_TIMEOUT_MS) {
            Some(raw) => {
                let millis = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidInteger {
                        key: ENV_MESSAGING_TIMEOUT_MS,
                        value: raw.clone(),
                    })?;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
            None => defaults.messaging_timeout,
        };

        let token_upload_url = lookup(ENV_TOKEN_UPLOAD_URL)
            .map(|raw| normalize_upload_url(&raw))
            .transpose()?;

        let auto_request_permission = match lookup(ENV_AUTO_REQUEST_PERMISSION) {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                key: ENV_AUTO_REQUEST_PERMISSION,
                value: raw,
            })?,
            None => defaults.auto_request_permission,
        };

        let log_filter = lookup(ENV_LOG_FILTER).unwrap_or(defaults.log_filter);

        let config = Self {
            vapid_key,
            sent_flag_key,
            messaging_timeout,
            token_upload_url,
            auto_request_permission,
            log_filter,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_vapid_key(&self.vapid_key)?;
        if self.sent_flag_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}

pub fn normalize_vapid_key(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyVapidKey);
    }
    let decoded = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|_| ConfigError::VapidKeyEncoding)?;
    if decoded.len() != VAPID_PUBLIC_KEY_LEN || decoded.first() != Some(&VAPID_UNCOMPRESSED_TAG) {
        return Err(ConfigError::VapidKeyShape);
    }
    Ok(trimmed.to_string())
}

pub fn normalize_upload_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidUploadUrl);
    };
    if !matches!(scheme, "http" | "https") {
        return Err(ConfigError::InvalidUploadUrl);
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidUploadUrl);
    }
    Ok(trimmed.to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
