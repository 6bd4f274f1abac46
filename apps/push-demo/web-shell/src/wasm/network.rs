use super::*;

use std::time::Duration;

use async_trait::async_trait;
use gloo_net::http::Request;
use push_client_core::{RegistrationToken, SinkError, Sleeper};

pub(super) struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}

#[derive(Debug, Serialize)]
struct TokenUploadBody<'a> {
    token: &'a str,
}

/// POSTs `{"token": ...}` to the configured endpoint.
pub(super) struct HttpTokenSink {
    url: String,
}

impl HttpTokenSink {
    pub(super) fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait(?Send)]
impl TokenSink for HttpTokenSink {
    async fn upload_token(&self, token: &RegistrationToken) -> Result<(), SinkError> {
        let response = Request::post(&self.url)
            .json(&TokenUploadBody {
                token: token.as_str(),
            })
            .map_err(|error| SinkError::Upload(format!("failed to encode upload body: {error}")))?
            .send()
            .await
            .map_err(|error| SinkError::Upload(error.to_string()))?;
        if !response.ok() {
            return Err(SinkError::Status {
                status: response.status(),
            });
        }
        tracing::debug!(url = %self.url, "token uploaded");
        Ok(())
    }
}
