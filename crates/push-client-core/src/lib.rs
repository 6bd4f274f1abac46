//! Core of the push demo client: fetch a registration token from the
//! messaging service, forward it once, show it, and log foreground
//! messages. Everything host-specific sits behind a trait so the browser
//! shell and the tests plug in their own collaborators.

pub mod config;
pub mod controller;
pub mod forwarding;
pub mod messaging;
pub mod permission;
pub mod sent_flag;
pub mod timing;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, PushDemoConfig};
pub use controller::{
    ControllerSnapshot, DeleteOutcome, PermissionOutcome, PushCollaborators, PushController,
    ResetOutcome,
};
pub use forwarding::{ForwardOutcome, LoggingTokenSink, SinkError, TokenSink};
pub use messaging::{
    GetTokenOptions, MessageHandler, MessagePayload, MessagingClient, MessagingError,
    RegistrationToken,
};
pub use permission::{NotificationPermission, PermissionError, PermissionHost};
pub use sent_flag::{KeyValueStore, MemoryStore, SentFlag, StoreError};
pub use timing::Sleeper;
pub use ui::{Region, RenderError, Renderer, UiState};
