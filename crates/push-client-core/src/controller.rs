//! Token, permission and message flows for the push demo page.
//!
//! Every collaborator is injected. Flows are plain async functions that
//! report what happened through an outcome enum; collaborator failures are
//! folded into those outcomes and only renderer failures surface as `Err`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::Serialize;

use crate::config::PushDemoConfig;
use crate::forwarding::{ForwardOutcome, TokenSink, forward_token};
use crate::messaging::{
    GetTokenOptions, MessagePayload, MessagingClient, MessagingError, RegistrationToken,
};
use crate::permission::{NotificationPermission, PermissionError, PermissionHost};
use crate::sent_flag::{KeyValueStore, SentFlag};
use crate::timing::{Sleeper, with_deadline};
use crate::ui::{RenderError, Renderer, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    TokenShown(RegistrationToken),
    PermissionRequired,
    FetchFailed(MessagingError),
    /// Aborted by a newer reset or by `cancel_pending`; UI and flag untouched.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(ResetOutcome),
    NoToken,
    /// The flag and UI are left as they were.
    DeletionFailed(MessagingError),
    FetchFailed(MessagingError),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted(ResetOutcome),
    NotGranted(NotificationPermission),
    Unavailable(PermissionError),
    Cancelled,
}

/// Point-in-time view of the controller, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub ui: UiState,
    pub token_sent: bool,
    pub messages_received: u64,
    pub in_flight_flows: usize,
    pub last_error: Option<String>,
}

pub struct PushCollaborators {
    pub messaging: Rc<dyn MessagingClient>,
    pub permissions: Rc<dyn PermissionHost>,
    pub store: Rc<dyn KeyValueStore>,
    pub sink: Rc<dyn TokenSink>,
    pub renderer: Rc<dyn Renderer>,
    pub sleeper: Rc<dyn Sleeper>,
}

pub struct PushController {
    config: PushDemoConfig,
    messaging: Rc<dyn MessagingClient>,
    permissions: Rc<dyn PermissionHost>,
    sink: Rc<dyn TokenSink>,
    renderer: Rc<dyn Renderer>,
    sleeper: Rc<dyn Sleeper>,
    flag: SentFlag,
    ui: RefCell<UiState>,
    messages_received: Cell<u64>,
    last_error: RefCell<Option<String>>,
    next_flow_id: Cell<u64>,
    in_flight: RefCell<BTreeMap<u64, AbortHandle>>,
    latest_reset: Cell<Option<u64>>,
}

enum DeleteStep {
    Deleted,
    NoToken,
    DeletionFailed(MessagingError),
    FetchFailed(MessagingError),
}

impl PushController {
    pub fn new(config: PushDemoConfig, collaborators: PushCollaborators) -> Self {
        let flag = SentFlag::new(collaborators.store, config.sent_flag_key.clone());
        Self {
            config,
            messaging: collaborators.messaging,
            permissions: collaborators.permissions,
            sink: collaborators.sink,
            renderer: collaborators.renderer,
            sleeper: collaborators.sleeper,
            flag,
            ui: RefCell::new(UiState::Loading),
            messages_received: Cell::new(0),
            last_error: RefCell::new(None),
            next_flow_id: Cell::new(1),
            in_flight: RefCell::new(BTreeMap::new()),
            latest_reset: Cell::new(None),
        }
    }

    pub fn sent_flag(&self) -> &SentFlag {
        &self.flag
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            ui: self.ui.borrow().clone(),
            token_sent: self.flag.is_sent(),
            messages_received: self.messages_received.get(),
            in_flight_flows: self.in_flight.borrow().len(),
            last_error: self.last_error.borrow().clone(),
        }
    }

    /// Page load: hook up the message listener, then run the reset flow.
    /// With `auto_request_permission` a missing token triggers one prompt.
    pub async fn start(self: &Rc<Self>) -> Result<ResetOutcome, RenderError> {
        if let Err(error) = self.install_message_listener() {
            tracing::warn!(%error, "foreground message listener not installed");
            self.record_error(&error);
        }

        let outcome = self.reset_flow().await?;
        if outcome != ResetOutcome::PermissionRequired || !self.config.auto_request_permission {
            return Ok(outcome);
        }

        match self.request_permission().await? {
            PermissionOutcome::Granted(outcome) => Ok(outcome),
            PermissionOutcome::NotGranted(_)
            | PermissionOutcome::Unavailable(_)
            | PermissionOutcome::Cancelled => Ok(ResetOutcome::PermissionRequired),
        }
    }

    pub fn install_message_listener(self: &Rc<Self>) -> Result<(), MessagingError> {
        let controller = Rc::downgrade(self);
        self.messaging.on_message(Box::new(move |payload| {
            let Some(controller) = controller.upgrade() else {
                return Ok(());
            };
            controller.handle_foreground_message(&payload)
        }))
    }

    pub fn handle_foreground_message(&self, payload: &MessagePayload) -> Result<(), RenderError> {
        tracing::info!(%payload, "Message received.");
        self.renderer.append_message(payload)?;
        self.messages_received
            .set(self.messages_received.get().saturating_add(1));
        Ok(())
    }

    pub async fn reset_flow(&self) -> Result<ResetOutcome, RenderError> {
        self.renderer.clear_messages()?;
        self.set_ui(UiState::Loading)?;

        let (flow_id, registration) = self.begin_flow();
        if let Some(previous) = self.latest_reset.replace(Some(flow_id)) {
            self.abort_flow(previous);
        }

        let options = GetTokenOptions {
            vapid_key: self.config.vapid_key.clone(),
        };
        let fetch = with_deadline(
            self.sleeper.as_ref(),
            self.config.messaging_timeout,
            "getToken",
            self.messaging.get_token(&options),
        );
        let fetched = Abortable::new(fetch, registration).await;
        self.end_flow(flow_id);

        let Ok(fetched) = fetched else {
            tracing::debug!(flow_id, "token fetch cancelled");
            return Ok(ResetOutcome::Cancelled);
        };

        match fetched {
            Ok(Some(token)) => {
                let forwarded = forward_token(&self.flag, self.sink.as_ref(), &token).await;
                if let ForwardOutcome::UploadFailed(error) = &forwarded {
                    self.record_error(error);
                }
                if self.latest_reset.get() != Some(flow_id) {
                    tracing::debug!(flow_id, "newer reset started while forwarding");
                    return Ok(ResetOutcome::Cancelled);
                }
                self.set_ui(UiState::TokenShown(token.to_string()))?;
                Ok(ResetOutcome::TokenShown(token))
            }
            Ok(None) => {
                tracing::info!(
                    "No registration token available. Request permission to generate one."
                );
                self.set_ui(UiState::PermissionRequired)?;
                self.flag.set_sent(false);
                Ok(ResetOutcome::PermissionRequired)
            }
            Err(error) => {
                tracing::warn!(%error, "An error occurred while retrieving token.");
                self.set_ui(UiState::fetch_error(&error))?;
                self.flag.set_sent(false);
                self.record_error(&error);
                Ok(ResetOutcome::FetchFailed(error))
            }
        }
    }

    pub async fn request_permission(&self) -> Result<PermissionOutcome, RenderError> {
        tracing::info!("Requesting permission...");
        let (flow_id, registration) = self.begin_flow();
        let answered = Abortable::new(self.permissions.request_permission(), registration).await;
        self.end_flow(flow_id);

        let Ok(answered) = answered else {
            return Ok(PermissionOutcome::Cancelled);
        };

        match answered {
            Ok(NotificationPermission::Granted) => {
                tracing::info!("Notification permission granted.");
                let outcome = self.reset_flow().await?;
                Ok(PermissionOutcome::Granted(outcome))
            }
            Ok(permission) => {
                tracing::info!(
                    permission = permission.as_str(),
                    "Unable to get permission to notify."
                );
                Ok(PermissionOutcome::NotGranted(permission))
            }
            Err(error) => {
                tracing::warn!(%error, "Unable to get permission to notify.");
                self.record_error(&error);
                Ok(PermissionOutcome::Unavailable(error))
            }
        }
    }

    pub async fn delete_current_token(&self) -> Result<DeleteOutcome, RenderError> {
        let (flow_id, registration) = self.begin_flow();
        let steps = async {
            let current = with_deadline(
                self.sleeper.as_ref(),
                self.config.messaging_timeout,
                "getToken",
                self.messaging.current_token(),
            )
            .await;
            let token = match current {
                Ok(Some(token)) => token,
                Ok(None) => return DeleteStep::NoToken,
                Err(error) => return DeleteStep::FetchFailed(error),
            };
            match with_deadline(
                self.sleeper.as_ref(),
                self.config.messaging_timeout,
                "deleteToken",
                self.messaging.delete_token(&token),
            )
            .await
            {
                Ok(()) => DeleteStep::Deleted,
                Err(error) => DeleteStep::DeletionFailed(error),
            }
        };
        let step = Abortable::new(steps, registration).await;
        self.end_flow(flow_id);

        let Ok(step) = step else {
            return Ok(DeleteOutcome::Cancelled);
        };

        match step {
            DeleteStep::Deleted => {
                tracing::info!("Token deleted.");
                self.flag.set_sent(false);
                let outcome = self.reset_flow().await?;
                Ok(DeleteOutcome::Deleted(outcome))
            }
            DeleteStep::NoToken => {
                tracing::info!("No registration token to delete.");
                Ok(DeleteOutcome::NoToken)
            }
            DeleteStep::DeletionFailed(error) => {
                tracing::warn!(%error, "Unable to delete token.");
                self.record_error(&error);
                Ok(DeleteOutcome::DeletionFailed(error))
            }
            DeleteStep::FetchFailed(error) => {
                tracing::warn!(%error, "Error retrieving registration token.");
                self.set_ui(UiState::fetch_error(&error))?;
                self.record_error(&error);
                Ok(DeleteOutcome::FetchFailed(error))
            }
        }
    }

    /// Aborts every flow currently waiting on a collaborator. Returns how
    /// many were aborted.
    pub fn cancel_pending(&self) -> usize {
        let handles = std::mem::take(&mut *self.in_flight.borrow_mut());
        for handle in handles.values() {
            handle.abort();
        }
        if !handles.is_empty() {
            tracing::info!(count = handles.len(), "cancelled pending flows");
        }
        handles.len()
    }

    fn set_ui(&self, state: UiState) -> Result<(), RenderError> {
        self.renderer.render(&state)?;
        *self.ui.borrow_mut() = state;
        Ok(())
    }

    fn record_error(&self, error: &dyn std::fmt::Display) {
        *self.last_error.borrow_mut() = Some(error.to_string());
    }

    fn begin_flow(&self) -> (u64, AbortRegistration) {
        let flow_id = self.next_flow_id.get();
        self.next_flow_id.set(flow_id.wrapping_add(1));
        let (handle, registration) = AbortHandle::new_pair();
        self.in_flight.borrow_mut().insert(flow_id, handle);
        (flow_id, registration)
    }

    fn end_flow(&self, flow_id: u64) {
        self.in_flight.borrow_mut().remove(&flow_id);
    }

    fn abort_flow(&self, flow_id: u64) {
        if let Some(handle) = self.in_flight.borrow_mut().remove(&flow_id) {
            handle.abort();
        }
    }
}
