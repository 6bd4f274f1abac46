use async_trait::async_trait;
use serde::Serialize;

/// Result of a notification permission prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// The user dismissed the prompt without deciding.
    Default,
    Other(String),
}

impl NotificationPermission {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            "default" => Self::Default,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Default => "default",
            Self::Other(value) => value,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("notification api unavailable: {0}")]
    Unavailable(String),
    #[error("permission request failed: {0}")]
    RequestFailed(String),
}

#[async_trait(?Send)]
pub trait PermissionHost {
    async fn request_permission(&self) -> Result<NotificationPermission, PermissionError>;
}
