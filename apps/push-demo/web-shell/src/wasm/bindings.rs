use super::*;

use async_trait::async_trait;
use push_client_core::{
    GetTokenOptions, MessageHandler, MessagingClient, MessagingError, NotificationPermission,
    PermissionError, PermissionHost, RegistrationToken,
};
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// The object returned by `firebase.messaging()`.
    type JsMessaging;

    #[wasm_bindgen(catch, js_namespace = firebase, js_name = messaging)]
    fn firebase_messaging() -> Result<JsMessaging, JsValue>;

    #[wasm_bindgen(catch, method, js_name = getToken)]
    fn get_token_with_options(
        this: &JsMessaging,
        options: &JsValue,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, method, js_name = getToken)]
    fn get_token(this: &JsMessaging) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, method, js_name = deleteToken)]
    fn delete_token(this: &JsMessaging, token: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, method, js_name = onMessage)]
    fn on_message(this: &JsMessaging, callback: &js_sys::Function) -> Result<JsValue, JsValue>;
}

pub(super) fn js_error_text(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    error
        .as_string()
        .unwrap_or_else(|| format!("{error:?}"))
}

fn rejected(operation: &str, error: &JsValue) -> MessagingError {
    MessagingError::Rejected(format!("{operation} failed: {}", js_error_text(error)))
}

fn token_from_js(value: &JsValue) -> Option<RegistrationToken> {
    value.as_string().and_then(RegistrationToken::new)
}

/// Converts a delivered payload into JSON. Cyclic or BigInt payloads make
/// `JSON.stringify` throw; that error goes back to the SDK's dispatcher.
fn payload_from_js(payload: &JsValue) -> Result<serde_json::Value, JsValue> {
    let text = js_sys::JSON::stringify(payload)?;
    let Some(text) = text.as_string() else {
        return Ok(serde_json::Value::Null);
    };
    serde_json::from_str(&text)
        .map_err(|error| JsValue::from_str(&format!("message payload is not JSON: {error}")))
}

/// `MessagingClient` over the page's Firebase messaging SDK.
pub(super) struct FirebaseMessaging {
    inner: JsMessaging,
    on_message_handler: RefCell<Option<Closure<dyn FnMut(JsValue) -> Result<(), JsValue>>>>,
}

impl FirebaseMessaging {
    pub(super) fn from_global() -> Result<Self, MessagingError> {
        let inner = firebase_messaging().map_err(|error| {
            MessagingError::Unavailable(format!(
                "firebase.messaging() is not available: {}",
                js_error_text(&error)
            ))
        })?;
        Ok(Self {
            inner,
            on_message_handler: RefCell::new(None),
        })
    }
}

#[async_trait(?Send)]
impl MessagingClient for FirebaseMessaging {
    async fn get_token(
        &self,
        options: &GetTokenOptions,
    ) -> Result<Option<RegistrationToken>, MessagingError> {
        let encoded = serde_json::to_string(options)
            .map_err(|error| MessagingError::Rejected(format!("invalid token options: {error}")))?;
        let options = js_sys::JSON::parse(&encoded).map_err(|error| rejected("getToken", &error))?;
        let promise = self
            .inner
            .get_token_with_options(&options)
            .map_err(|error| rejected("getToken", &error))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|error| rejected("getToken", &error))?;
        Ok(token_from_js(&value))
    }

    async fn current_token(&self) -> Result<Option<RegistrationToken>, MessagingError> {
        let promise = self
            .inner
            .get_token()
            .map_err(|error| rejected("getToken", &error))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|error| rejected("getToken", &error))?;
        Ok(token_from_js(&value))
    }

    async fn delete_token(&self, token: &RegistrationToken) -> Result<(), MessagingError> {
        let promise = self
            .inner
            .delete_token(token.as_str())
            .map_err(|error| rejected("deleteToken", &error))?;
        JsFuture::from(promise)
            .await
            .map_err(|error| rejected("deleteToken", &error))?;
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> Result<(), MessagingError> {
        let callback = Closure::<dyn FnMut(JsValue) -> Result<(), JsValue>>::wrap(Box::new(
            move |payload: JsValue| {
                let payload = payload_from_js(&payload)?;
                handler(payload).map_err(|error| JsValue::from_str(&error.to_string()))
            },
        ));
        self.inner
            .on_message(callback.as_ref().unchecked_ref())
            .map_err(|error| rejected("onMessage", &error))?;
        *self.on_message_handler.borrow_mut() = Some(callback);
        Ok(())
    }
}

/// The browser `Notification.requestPermission()` prompt.
pub(super) struct BrowserPermissionHost;

#[async_trait(?Send)]
impl PermissionHost for BrowserPermissionHost {
    async fn request_permission(&self) -> Result<NotificationPermission, PermissionError> {
        let window = web_sys::window()
            .ok_or_else(|| PermissionError::Unavailable("window is unavailable".to_string()))?;
        let supported = js_sys::Reflect::has(&window, &JsValue::from_str("Notification"))
            .unwrap_or(false);
        if !supported {
            return Err(PermissionError::Unavailable(
                "this browser does not expose the Notification API".to_string(),
            ));
        }

        let promise = web_sys::Notification::request_permission()
            .map_err(|error| PermissionError::RequestFailed(js_error_text(&error)))?;
        let result = JsFuture::from(promise)
            .await
            .map_err(|error| PermissionError::RequestFailed(js_error_text(&error)))?;

        let status = result.as_string().unwrap_or_else(|| {
            match web_sys::Notification::permission() {
                web_sys::NotificationPermission::Granted => "granted",
                web_sys::NotificationPermission::Denied => "denied",
                _ => "default",
            }
            .to_string()
        });
        Ok(NotificationPermission::parse(&status))
    }
}
