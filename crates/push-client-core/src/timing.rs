use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{Either, select};

use crate::messaging::MessagingError;

/// Host timer. The browser shell backs this with `gloo-timers`.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Races `call` against `timeout`. Expiry drops the call and reports
/// `MessagingError::TimedOut`.
pub async fn with_deadline<T>(
    sleeper: &dyn Sleeper,
    timeout: Option<Duration>,
    operation: &'static str,
    call: impl Future<Output = Result<T, MessagingError>>,
) -> Result<T, MessagingError> {
    let Some(timeout) = timeout else {
        return call.await;
    };

    let call = pin!(call);
    let expiry = sleeper.sleep(timeout);
    match select(call, expiry).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(MessagingError::TimedOut {
            operation,
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ImmediateSleeper, NeverSleeper};

    #[tokio::test]
    async fn completed_call_wins() {
        let result = with_deadline(
            &NeverSleeper,
            Some(Duration::from_millis(10)),
            "getToken",
            async { Ok::<_, MessagingError>(7) },
        )
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn expired_deadline_reports_operation() {
        let result = with_deadline(
            &ImmediateSleeper,
            Some(Duration::from_millis(250)),
            "deleteToken",
            futures::future::pending::<Result<(), MessagingError>>(),
        )
        .await;
        assert_eq!(
            result,
            Err(MessagingError::TimedOut {
                operation: "deleteToken",
                after_ms: 250,
            })
        );
    }

    #[tokio::test]
    async fn no_timeout_awaits_call_directly() {
        let result = with_deadline(&ImmediateSleeper, None, "getToken", async {
            Err::<(), _>(MessagingError::Rejected("net down".to_string()))
        })
        .await;
        assert_eq!(result, Err(MessagingError::Rejected("net down".to_string())));
    }
}
