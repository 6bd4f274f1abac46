use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque per-install credential issued by the messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    /// Returns `None` for the empty string. Any other text, whitespace
    /// included, is a real token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTokenOptions {
    pub vapid_key: String,
}

/// A message delivered while the page is in the foreground.
pub type MessagePayload = Value;

/// Foreground message callback. Errors are returned to whoever dispatched
/// the message.
pub type MessageHandler = Box<dyn Fn(MessagePayload) -> Result<(), crate::ui::RenderError>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessagingError {
    #[error("{0}")]
    Rejected(String),
    #[error("{operation} timed out after {after_ms}ms")]
    TimedOut {
        operation: &'static str,
        after_ms: u64,
    },
    #[error("messaging service unavailable: {0}")]
    Unavailable(String),
}

/// The push-messaging SDK as seen by this client.
#[async_trait(?Send)]
pub trait MessagingClient {
    async fn get_token(
        &self,
        options: &GetTokenOptions,
    ) -> Result<Option<RegistrationToken>, MessagingError>;

    /// The token the SDK currently holds, without subscription options.
    async fn current_token(&self) -> Result<Option<RegistrationToken>, MessagingError>;

    async fn delete_token(&self, token: &RegistrationToken) -> Result<(), MessagingError>;

    fn on_message(&self, handler: MessageHandler) -> Result<(), MessagingError>;
}
