//! Value types describing a gateway call: where it goes, what it asks for, and
//! what came back.
//!
//! A [`GatewayRequest`] is built per call and never mutated once sent. The
//! endpoint lives separately in [`GatewayConfig`] so one configuration can
//! serve any number of requests.

use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::{CorrelationId, GatewayError, MethodName, ObjectId};

/// Request header carrying comma-separated call options (e.g. `oneway`).
pub const OPTIONS_HEADER: &str = "x-pyro-options";

/// Request header carrying the gateway's API key.
pub const GATEWAY_KEY_HEADER: &str = "x-pyro-gateway-key";

/// Request and response header carrying the call's correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-pyro-correlation-id";

// ---------------------------------------------------------------------------
// Endpoint configuration
// ---------------------------------------------------------------------------

/// Location of the gateway.
///
/// Passed explicitly to every caller; there is no process-wide endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host name or address of the gateway.
    pub host: String,
    /// TCP port of the gateway.
    pub port: u16,
    /// First path segment under which the gateway serves objects.
    pub prefix: String,
    /// `User-Agent` sent with every request. `None` uses the caller's default.
    pub user_agent: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            prefix: "pyro".to_string(),
            user_agent: None,
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration for `host:port` with the default prefix.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Replaces the path prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Checks that the endpoint can be addressed.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.host.trim().is_empty() {
            return Err(GatewayError::Configuration {
                message: "gateway host must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(GatewayError::Configuration {
                message: "gateway port must not be 0".to_string(),
            });
        }
        let base_url = self.base_url();
        Url::parse(&base_url).map_err(|e| GatewayError::Configuration {
            message: format!("gateway endpoint '{base_url}' is not a valid URL: {e}"),
        })?;
        Ok(())
    }

    /// Returns `http://<host>:<port>` with no trailing slash.
    ///
    /// IPv6 literals are wrapped in brackets.
    pub fn base_url(&self) -> String {
        let host = self.host.trim();
        if host.parse::<Ipv6Addr>().is_ok() {
            format!("http://[{}]:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// Optional per-call settings, each mapped onto one request header.
///
/// Headers are only sent for options that are set, so a default
/// [`CallOptions`] produces a bare GET.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Ask the gateway not to wait for the method's result. The gateway then
    /// answers `200` with an empty body.
    pub oneway: bool,
    /// Correlation id to propagate to the remote side.
    pub correlation_id: Option<CorrelationId>,
    /// Key for gateways that require one.
    pub gateway_key: Option<String>,
}

impl CallOptions {
    /// Returns the `(name, value)` header pairs for the options that are set.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if self.oneway {
            headers.push((OPTIONS_HEADER, "oneway".to_string()));
        }
        if let Some(key) = &self.gateway_key {
            headers.push((GATEWAY_KEY_HEADER, key.clone()));
        }
        if let Some(id) = self.correlation_id {
            headers.push((CORRELATION_ID_HEADER, id.to_string()));
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Describes one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    object: ObjectId,
    method: MethodName,
    query: Option<String>,
    options: CallOptions,
}

impl GatewayRequest {
    /// Creates a request for `method` on `object` with no extra arguments.
    pub fn new(object: ObjectId, method: MethodName) -> Self {
        Self {
            object,
            method,
            query: None,
            options: CallOptions::default(),
        }
    }

    /// Creates a request from raw strings, rejecting empty names.
    pub fn from_parts(object: &str, method: &str) -> Result<Self, GatewayError> {
        let object = ObjectId::new(object).ok_or_else(|| GatewayError::InvalidRequest {
            message: "object id must not be empty".to_string(),
        })?;
        let method = MethodName::new(method).ok_or_else(|| GatewayError::InvalidRequest {
            message: "method name must not be empty".to_string(),
        })?;
        Ok(Self::new(object, method))
    }

    /// Attaches a raw, already-encoded query string (without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Appends one form-urlencoded `key=value` argument to the query string.
    #[must_use]
    pub fn with_arg(mut self, key: &str, value: &str) -> Self {
        let mut query = form_urlencoded::Serializer::new(self.query.take().unwrap_or_default());
        query.append_pair(key, value);
        self.query = Some(query.finish());
        self
    }

    /// Replaces the call options.
    #[must_use]
    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// The remote object being invoked.
    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    /// The method being invoked, including any embedded query.
    pub fn method(&self) -> &MethodName {
        &self.method
    }

    /// Query arguments attached with [`Self::with_query`] or [`Self::with_arg`].
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Options for this call.
    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    /// Returns `/<prefix>/<objectId>/<methodName>`.
    ///
    /// Slashes around `prefix` are ignored; an empty prefix yields
    /// `/<objectId>/<methodName>`. Names are inserted as given; [`Self::url`]
    /// is the percent-encoded form. Attached query arguments are not part of
    /// the path.
    pub fn path(&self, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("/{}/{}", self.object, self.method)
        } else {
            format!("/{}/{}/{}", prefix, self.object, self.method)
        }
    }

    /// Builds the absolute request URL against `config`.
    ///
    /// The object id and method name are percent-encoded as single path
    /// segments, so characters such as `#`, `/` or spaces stay part of the
    /// name. The method's embedded query and any attached arguments form the
    /// query string.
    pub fn url(&self, config: &GatewayConfig) -> Result<Url, GatewayError> {
        let base_url = config.base_url();
        let mut url = Url::parse(&base_url).map_err(|e| GatewayError::InvalidRequest {
            message: format!("cannot build URL from '{base_url}': {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidRequest {
                message: format!("'{base_url}' cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(config.prefix.split('/').filter(|s| !s.is_empty()))
            .push(self.object.as_str())
            .push(self.method.name());

        let query = match (self.method.query(), self.query.as_deref()) {
            (Some(embedded), Some(extra)) => Some(format!("{embedded}&{extra}")),
            (Some(embedded), None) => Some(embedded.to_string()),
            (None, Some(extra)) => Some(extra.to_string()),
            (None, None) => None,
        };
        url.set_query(query.as_deref());
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Result of a successful (`200 OK`) gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// HTTP status code; always `200` for a value that reached the caller.
    pub status: u16,
    /// Parsed body; [`Value::Null`] when the body was empty.
    pub value: Value,
    /// Correlation id echoed by the gateway, if any.
    pub correlation_id: Option<CorrelationId>,
    /// Charset the body was decoded with.
    pub charset: String,
}

/// An exception raised by the remote method, as serialised by the gateway in
/// the body of a `500` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteException {
    /// Fully qualified exception class, e.g. `"builtins.ValueError"`.
    #[serde(rename = "__class__")]
    pub class: String,
    /// Constructor arguments of the exception.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Extra attributes carried by the exception.
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

impl RemoteException {
    /// Parses a remote exception from a response body, returning `None` when
    /// the body is not one.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl std::fmt::Display for RemoteException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}
