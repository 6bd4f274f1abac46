//! Hand-off of the registration token to the application server.

use async_trait::async_trait;

use crate::messaging::RegistrationToken;
use crate::sent_flag::SentFlag;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("token upload failed: {0}")]
    Upload(String),
    #[error("token upload rejected with status {status}")]
    Status { status: u16 },
}

/// Where tokens go once fetched.
#[async_trait(?Send)]
pub trait TokenSink {
    async fn upload_token(&self, token: &RegistrationToken) -> Result<(), SinkError>;
}

/// Sink used when no upload endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTokenSink;

#[async_trait(?Send)]
impl TokenSink for LoggingTokenSink {
    async fn upload_token(&self, token: &RegistrationToken) -> Result<(), SinkError> {
        tracing::info!(token = %token, "no upload endpoint configured; token not transmitted");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    Uploaded,
    AlreadySent,
    /// The flag stays set even though the upload failed.
    UploadFailed(SinkError),
}

/// Uploads `token` unless the flag says it was already sent. The flag is set
/// before the upload starts and is not rolled back on failure.
pub async fn forward_token(
    flag: &SentFlag,
    sink: &dyn TokenSink,
    token: &RegistrationToken,
) -> ForwardOutcome {
    if flag.is_sent() {
        tracing::info!("Token already sent to server so won't send it again unless it changes");
        return ForwardOutcome::AlreadySent;
    }

    tracing::info!("Sending token to server...");
    flag.set_sent(true);
    match sink.upload_token(token).await {
        Ok(()) => ForwardOutcome::Uploaded,
        Err(error) => {
            tracing::warn!(%error, "token upload failed");
            ForwardOutcome::UploadFailed(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sent_flag::MemoryStore;
    use crate::test_support::RecordingSink;
    use std::rc::Rc;

    fn token(raw: &str) -> RegistrationToken {
        RegistrationToken::new(raw).expect("non-empty token")
    }

    #[tokio::test]
    async fn forwarding_twice_uploads_once() {
        let flag = SentFlag::new(Rc::new(MemoryStore::new()), "sentToServer");
        let sink = RecordingSink::default();

        let first = forward_token(&flag, &sink, &token("T1")).await;
        assert_eq!(first, ForwardOutcome::Uploaded);
        assert!(flag.is_sent());

        let second = forward_token(&flag, &sink, &token("T1")).await;
        assert_eq!(second, ForwardOutcome::AlreadySent);
        assert!(flag.is_sent());
        assert_eq!(sink.uploads(), vec!["T1".to_string()]);
    }

    #[tokio::test]
    async fn rotated_token_is_not_reuploaded_while_flag_is_set() {
        let flag = SentFlag::new(Rc::new(MemoryStore::new()), "sentToServer");
        let sink = RecordingSink::default();

        forward_token(&flag, &sink, &token("T1")).await;
        let outcome = forward_token(&flag, &sink, &token("T2")).await;

        assert_eq!(outcome, ForwardOutcome::AlreadySent);
        assert_eq!(sink.uploads(), vec!["T1".to_string()]);
    }

    #[tokio::test]
    async fn failed_upload_keeps_flag_set() {
        let flag = SentFlag::new(Rc::new(MemoryStore::new()), "sentToServer");
        let sink = RecordingSink::failing(SinkError::Status { status: 503 });

        let outcome = forward_token(&flag, &sink, &token("T1")).await;

        assert_eq!(
            outcome,
            ForwardOutcome::UploadFailed(SinkError::Status { status: 503 })
        );
        assert!(flag.is_sent());
    }

    #[tokio::test]
    async fn logging_sink_always_succeeds() {
        assert_eq!(LoggingTokenSink.upload_token(&token("T1")).await, Ok(()));
    }
}
