//! In-memory collaborators for controller tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;

use crate::forwarding::{SinkError, TokenSink};
use crate::messaging::{
    GetTokenOptions, MessageHandler, MessagePayload, MessagingClient, MessagingError,
    RegistrationToken,
};
use crate::permission::{NotificationPermission, PermissionError, PermissionHost};
use crate::timing::Sleeper;
use crate::ui::{MESSAGES_ID, Region, RenderError, Renderer};

/// A scripted collaborator response. `Pending` never resolves.
pub(crate) enum Scripted<T, E = MessagingError> {
    Ready(Result<T, E>),
    Pending,
}

impl Scripted<Option<RegistrationToken>> {
    pub(crate) fn token(raw: &str) -> Self {
        Self::Ready(Ok(RegistrationToken::new(raw)))
    }

    pub(crate) fn no_token() -> Self {
        Self::Ready(Ok(None))
    }
}

impl<T> Scripted<T> {
    pub(crate) fn rejected(detail: &str) -> Self {
        Self::Ready(Err(MessagingError::Rejected(detail.to_string())))
    }
}

async fn resolve<T, E>(next: Option<Scripted<T, E>>, unscripted: E) -> Result<T, E> {
    match next {
        Some(Scripted::Ready(result)) => result,
        Some(Scripted::Pending) => futures::future::pending().await,
        None => Err(unscripted),
    }
}

#[derive(Default)]
pub(crate) struct FakeMessaging {
    get_token_script: RefCell<VecDeque<Scripted<Option<RegistrationToken>>>>,
    current_token_script: RefCell<VecDeque<Scripted<Option<RegistrationToken>>>>,
    delete_script: RefCell<VecDeque<Scripted<()>>>,
    requested_vapid_keys: RefCell<Vec<String>>,
    deleted_tokens: RefCell<Vec<String>>,
    handler: RefCell<Option<MessageHandler>>,
}

impl FakeMessaging {
    pub(crate) fn script_get_token(&self, response: Scripted<Option<RegistrationToken>>) {
        self.get_token_script.borrow_mut().push_back(response);
    }

    pub(crate) fn script_current_token(&self, response: Scripted<Option<RegistrationToken>>) {
        self.current_token_script.borrow_mut().push_back(response);
    }

    pub(crate) fn script_delete(&self, response: Scripted<()>) {
        self.delete_script.borrow_mut().push_back(response);
    }

    pub(crate) fn requested_vapid_keys(&self) -> Vec<String> {
        self.requested_vapid_keys.borrow().clone()
    }

    pub(crate) fn get_token_calls(&self) -> usize {
        self.requested_vapid_keys.borrow().len()
    }

    pub(crate) fn deleted_tokens(&self) -> Vec<String> {
        self.deleted_tokens.borrow().clone()
    }

    pub(crate) fn has_handler(&self) -> bool {
        self.handler.borrow().is_some()
    }

    pub(crate) fn deliver(&self, payload: MessagePayload) -> Result<(), RenderError> {
        match self.handler.borrow().as_ref() {
            Some(handler) => handler(payload),
            None => Ok(()),
        }
    }
}

fn unscripted(operation: &str) -> MessagingError {
    MessagingError::Unavailable(format!("no scripted response for {operation}"))
}

#[async_trait(?Send)]
impl MessagingClient for FakeMessaging {
    async fn get_token(
        &self,
        options: &GetTokenOptions,
    ) -> Result<Option<RegistrationToken>, MessagingError> {
        self.requested_vapid_keys
            .borrow_mut()
            .push(options.vapid_key.clone());
        let next = self.get_token_script.borrow_mut().pop_front();
        resolve(next, unscripted("getToken")).await
    }

    async fn current_token(&self) -> Result<Option<RegistrationToken>, MessagingError> {
        let next = self.current_token_script.borrow_mut().pop_front();
        resolve(next, unscripted("getToken")).await
    }

    async fn delete_token(&self, token: &RegistrationToken) -> Result<(), MessagingError> {
        self.deleted_tokens.borrow_mut().push(token.to_string());
        let next = self.delete_script.borrow_mut().pop_front();
        resolve(next, unscripted("deleteToken")).await
    }

    fn on_message(&self, handler: MessageHandler) -> Result<(), MessagingError> {
        *self.handler.borrow_mut() = Some(handler);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePermissions {
    script: RefCell<VecDeque<Scripted<NotificationPermission, PermissionError>>>,
    calls: Cell<usize>,
}

impl FakePermissions {
    pub(crate) fn script(&self, response: Scripted<NotificationPermission, PermissionError>) {
        self.script.borrow_mut().push_back(response);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl PermissionHost for FakePermissions {
    async fn request_permission(&self) -> Result<NotificationPermission, PermissionError> {
        self.calls.set(self.calls.get() + 1);
        let next = self.script.borrow_mut().pop_front();
        resolve(
            next,
            PermissionError::Unavailable("no scripted response".to_string()),
        )
        .await
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    uploads: RefCell<Vec<String>>,
    failure: Option<SinkError>,
}

impl RecordingSink {
    pub(crate) fn failing(error: SinkError) -> Self {
        Self {
            uploads: RefCell::default(),
            failure: Some(error),
        }
    }

    pub(crate) fn uploads(&self) -> Vec<String> {
        self.uploads.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TokenSink for RecordingSink {
    async fn upload_token(&self, token: &RegistrationToken) -> Result<(), SinkError> {
        self.uploads.borrow_mut().push(token.to_string());
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RendererSnapshot {
    pub(crate) token_text: String,
    pub(crate) regions: BTreeMap<&'static str, bool>,
    pub(crate) nodes: Vec<String>,
}

/// Renderer that keeps the page as plain data.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    page: RefCell<RendererSnapshot>,
    messages_missing: Cell<bool>,
}

impl RecordingRenderer {
    pub(crate) fn snapshot(&self) -> RendererSnapshot {
        self.page.borrow().clone()
    }

    pub(crate) fn token_text(&self) -> String {
        self.page.borrow().token_text.clone()
    }

    pub(crate) fn region_visible(&self, region: Region) -> bool {
        self.page
            .borrow()
            .regions
            .get(region.element_id())
            .copied()
            .unwrap_or(false)
    }

    pub(crate) fn message_nodes(&self) -> Vec<String> {
        self.page.borrow().nodes.clone()
    }

    pub(crate) fn remove_messages_container(&self) {
        self.messages_missing.set(true);
    }

    fn ensure_messages(&self) -> Result<(), RenderError> {
        if self.messages_missing.get() {
            return Err(RenderError::MissingElement(MESSAGES_ID.to_string()));
        }
        Ok(())
    }
}

impl Renderer for RecordingRenderer {
    fn show_token(&self, text: &str) -> Result<(), RenderError> {
        self.page.borrow_mut().token_text = text.to_string();
        Ok(())
    }

    fn show_region(&self, region: Region, visible: bool) -> Result<(), RenderError> {
        self.page
            .borrow_mut()
            .regions
            .insert(region.element_id(), visible);
        Ok(())
    }

    fn append_message_text(&self, header: &str, body_text: &str) -> Result<(), RenderError> {
        self.ensure_messages()?;
        let mut page = self.page.borrow_mut();
        page.nodes.push(header.to_string());
        page.nodes.push(body_text.to_string());
        Ok(())
    }

    fn clear_messages(&self) -> Result<(), RenderError> {
        self.ensure_messages()?;
        let mut page = self.page.borrow_mut();
        while page.nodes.pop().is_some() {}
        Ok(())
    }
}

pub(crate) struct NeverSleeper;

#[async_trait(?Send)]
impl Sleeper for NeverSleeper {
    async fn sleep(&self, _duration: Duration) {
        futures::future::pending::<()>().await;
    }
}

pub(crate) struct ImmediateSleeper;

#[async_trait(?Send)]
impl Sleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
