//! Error type for gateway calls.
//!
//! A call ends in exactly one of two ways: a parsed JSON value, or a
//! [`GatewayError`]. The two failure kinds the gateway protocol knows about are
//! [`GatewayError::Transport`] (the request never produced a response) and
//! [`GatewayError::Application`] (the gateway answered with a non-200 status).
//! Everything else is a local problem: a malformed body, a bad endpoint, or an
//! option that cannot be expressed as a header.
//!
//! None of these are retried.

use thiserror::Error;

use crate::RemoteException;

/// Errors produced while issuing a gateway call or interpreting its response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Connection-level failure: refused, DNS lookup failed, reset, or the
    /// body stream broke before end-of-stream.
    #[error("Transport error calling {url}: {source}")]
    Transport {
        /// The URL that was being requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The gateway answered with a status other than `200 OK`.
    #[error("Gateway returned HTTP {status}: {body}")]
    Application {
        /// HTTP status code of the response.
        status: u16,
        /// Decoded response body, kept verbatim for diagnostics.
        body: String,
        /// The remote exception, when the body is a serialised one.
        remote: Option<RemoteException>,
    },

    /// A `200 OK` response carried a body that is not valid JSON.
    #[error("Response body is not valid JSON: {source}")]
    Parse {
        /// The JSON parser error.
        #[source]
        source: serde_json::Error,
        /// The body that failed to parse.
        body: String,
    },

    /// The object name or method name was empty, or the request URL could not
    /// be built from them.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// The gateway endpoint configuration is invalid.
    ///
    /// Produced when a caller is constructed; a caller never starts with an
    /// invalid endpoint.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A call option could not be encoded as an HTTP header value.
    #[error("Invalid value for header '{name}': {message}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl GatewayError {
    /// Builds an [`GatewayError::Application`] from a non-200 response,
    /// extracting the remote exception when the body holds one.
    pub fn application(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let remote = RemoteException::from_body(&body);
        Self::Application {
            status,
            body,
            remote,
        }
    }

    /// Wraps a client error as [`GatewayError::Transport`].
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Returns the HTTP status for application errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Renders this error followed by every `source()` beneath it, joined
    /// with `": "`.
    ///
    /// Client errors usually keep the useful part (e.g. "Connection refused")
    /// several levels down. Messages already contained in the text so far are
    /// skipped.
    pub fn error_chain(&self) -> String {
        let mut chain = self.to_string();
        let mut next = std::error::Error::source(self);
        while let Some(cause) = next {
            let message = cause.to_string();
            if !chain.contains(&message) {
                chain.push_str(": ");
                chain.push_str(&message);
            }
            next = cause.source();
        }
        chain
    }

    /// Returns `true` if the request never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_keeps_plain_body() {
        let err = GatewayError::application(500, "error text");
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("error text"));
        match err {
            GatewayError::Application { remote, .. } => assert!(remote.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn application_error_extracts_remote_exception() {
        let body = r#"{"__class__": "builtins.KeyError", "__exception__": true, "args": ["missing"], "attributes": {}}"#;
        let err = GatewayError::application(500, body);
        match err {
            GatewayError::Application {
                remote: Some(remote),
                ..
            } => {
                assert_eq!(remote.class, "builtins.KeyError");
                assert_eq!(remote.args, vec![serde_json::json!("missing")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Error)]
    #[error("error sending request")]
    struct SendError(#[source] std::io::Error);

    #[test]
    fn error_chain_includes_nested_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = GatewayError::transport("http://127.0.0.1:1/pyro/a/b", SendError(io));

        assert!(!err.to_string().contains("refused"));
        assert_eq!(
            err.error_chain(),
            "Transport error calling http://127.0.0.1:1/pyro/a/b: error sending request: Connection refused"
        );
    }

    #[test]
    fn transport_error_reports_source() {
        let err = GatewayError::transport("http://localhost:1/pyro/a/b", "connection refused");
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }
}
