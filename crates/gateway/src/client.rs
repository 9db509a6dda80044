//! The [`GatewayClient`] port and the completion-handler dispatcher.
//!
//! Transports implement [`GatewayClient`]; code that prefers the
//! "call, then hand the result to a handler" shape uses [`dispatch`], which
//! reports failures on the diagnostic stream instead of returning them.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::{GatewayError, GatewayRequest, GatewayResponse};

/// Issues calls to an object gateway.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Sends `request` and returns the parsed body of a `200 OK` response.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] if no response was received.
    /// - [`GatewayError::Application`] for any status other than `200`.
    /// - [`GatewayError::Parse`] if a `200` body is not valid JSON.
    async fn call(&self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError>;
}

/// Runs `request` on `client` and passes the resulting value to `on_complete`.
///
/// On failure `on_complete` is not invoked; the error is written to the
/// diagnostic stream via [`report_failure`]. Returns `true` if the handler ran.
pub async fn dispatch<C, F>(client: &C, request: &GatewayRequest, on_complete: F) -> bool
where
    C: GatewayClient + ?Sized,
    F: FnOnce(Value) + Send,
{
    match client.call(request).await {
        Ok(response) => {
            on_complete(response.value);
            true
        }
        Err(err) => {
            report_failure(request, &err);
            false
        }
    }
}

/// Writes a failed call to the diagnostic stream.
///
/// Application errors include the status and the raw response body;
/// transport errors include the client's error description.
pub fn report_failure(request: &GatewayRequest, err: &GatewayError) {
    let object = request.object().as_str();
    let method = request.method().as_str();
    match err {
        GatewayError::Application {
            status,
            body,
            remote: Some(remote),
        } => error!(
            object,
            method,
            status,
            remote_exception = %remote,
            body = %body,
            "Server returned error response"
        ),
        GatewayError::Application { status, body, .. } => error!(
            object,
            method,
            status,
            body = %body,
            "Server returned error response"
        ),
        GatewayError::Transport { .. } => error!(
            object,
            method,
            error = %err.error_chain(),
            "Gateway call failed"
        ),
        GatewayError::Parse { source, body } => error!(
            object,
            method,
            error = %source,
            body = %body,
            "Server returned a body that is not valid JSON"
        ),
        other => error!(object, method, error = %other, "Gateway call was not sent"),
    }
    info!(object, method, "Completion handler not invoked");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    /// Answers every call with a canned outcome.
    struct CannedClient {
        outcome: Mutex<Option<Result<GatewayResponse, GatewayError>>>,
    }

    impl CannedClient {
        fn new(outcome: Result<GatewayResponse, GatewayError>) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
            }
        }

        fn ok(value: Value) -> Self {
            Self::new(Ok(GatewayResponse {
                status: 200,
                value,
                correlation_id: None,
                charset: "utf-8".to_string(),
            }))
        }
    }

    #[async_trait]
    impl GatewayClient for CannedClient {
        async fn call(&self, _request: &GatewayRequest) -> Result<GatewayResponse, GatewayError> {
            self.outcome
                .lock()
                .unwrap()
                .take()
                .expect("canned client called twice")
        }
    }

    fn list_request() -> GatewayRequest {
        GatewayRequest::from_parts("Pyro.NameServer", "list").unwrap()
    }

    #[tokio::test]
    async fn handler_receives_value_on_success() {
        let client = CannedClient::ok(json!({"a": 1}));
        let mut received = None;

        let invoked = dispatch(&client, &list_request(), |value| received = Some(value)).await;

        assert!(invoked);
        assert_eq!(received, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn handler_receives_null_for_empty_body() {
        let client = CannedClient::ok(Value::Null);
        let mut received = None;

        assert!(dispatch(&client, &list_request(), |value| received = Some(value)).await);
        assert_eq!(received, Some(Value::Null));
    }

    #[tokio::test]
    #[traced_test]
    async fn application_error_is_logged_not_delivered() {
        let client = CannedClient::new(Err(GatewayError::application(500, "error text")));
        let mut invoked = false;

        let delivered = dispatch(&client, &list_request(), |_| invoked = true).await;

        assert!(!delivered);
        assert!(!invoked);
        assert!(logs_contain("Server returned error response"));
        assert!(logs_contain("error text"));
        assert!(logs_contain("status=500"));
    }

    #[tokio::test]
    #[traced_test]
    async fn transport_error_is_logged_not_delivered() {
        let client = CannedClient::new(Err(GatewayError::transport(
            "http://localhost:8080/pyro/Pyro.NameServer/list",
            "connection refused",
        )));
        let mut invoked = false;

        assert!(!dispatch(&client, &list_request(), |_| invoked = true).await);
        assert!(!invoked);
        assert!(logs_contain("connection refused"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendError(#[source] std::io::Error);

    #[tokio::test]
    #[traced_test]
    async fn transport_error_log_includes_underlying_cause() {
        let refused =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let client = CannedClient::new(Err(GatewayError::transport(
            "http://127.0.0.1:1/pyro/Pyro.NameServer/list",
            SendError(refused),
        )));

        assert!(!dispatch(&client, &list_request(), |_| {}).await);
        assert!(logs_contain("error sending request: Connection refused"));
    }

    #[tokio::test]
    #[traced_test]
    async fn parse_error_is_logged_not_delivered() {
        let err = crate::parse_body("{not json").unwrap_err();
        let client = CannedClient::new(Err(err));
        let mut invoked = false;

        assert!(!dispatch(&client, &list_request(), |_| invoked = true).await);
        assert!(!invoked);
        assert!(logs_contain("not valid JSON"));
        assert!(logs_contain("{not json"));
    }

    #[tokio::test]
    async fn dispatch_accepts_trait_objects() {
        let client: Box<dyn GatewayClient> = Box::new(CannedClient::ok(json!([1, 2])));
        let mut received = None;

        assert!(dispatch(client.as_ref(), &list_request(), |value| received = Some(value)).await);
        assert_eq!(received, Some(json!([1, 2])));
    }
}
