//! [`HttpGatewayCaller`]: the reqwest-backed [`GatewayClient`].

use async_trait::async_trait;
use gateway::{
    decode_body, dispatch, parse_body, resolve_charset, CorrelationId,
    GatewayClient, GatewayConfig, GatewayError, GatewayRequest, GatewayResponse, Value,
    CORRELATION_ID_HEADER,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error, instrument};

/// `User-Agent` sent when the configuration does not name one.
const DEFAULT_USER_AGENT: &str = concat!("gateway-caller/", env!("CARGO_PKG_VERSION"));

/// Calls an object gateway over HTTP/1.1.
///
/// Each call is a single GET; the whole body is buffered before it is decoded
/// and parsed. Nothing is retried.
///
/// `HttpGatewayCaller` is `Clone + Send + Sync`; clones share the underlying
/// `reqwest::Client`, so concurrent calls from many tasks need no locking.
#[derive(Debug, Clone)]
pub struct HttpGatewayCaller {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGatewayCaller {
    /// Creates a caller for the endpoint in `config`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] if the endpoint is invalid or the HTTP
    /// client cannot be initialised.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| GatewayError::Configuration {
                message: format!("failed to initialise HTTP client: {e}"),
            })?;
        Self::with_client(config, client)
    }

    /// Creates a caller that sends requests through an existing client.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] if the endpoint is invalid.
    pub fn with_client(config: GatewayConfig, client: reqwest::Client) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// The endpoint this caller talks to.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Calls `method` on `object` and hands the parsed result to `on_complete`.
    ///
    /// `method` may embed a query string (`"lookup?name=X"`). On any failure,
    /// including empty names, the handler is not invoked and the problem is
    /// logged. Returns `true` if the handler ran.
    pub async fn call_with<F>(&self, object: &str, method: &str, on_complete: F) -> bool
    where
        F: FnOnce(Value) + Send,
    {
        match GatewayRequest::from_parts(object, method) {
            Ok(request) => dispatch(self, &request, on_complete).await,
            Err(err) => {
                error!(object, method, error = %err, "Gateway call was not sent");
                false
            }
        }
    }

    fn request_headers(request: &GatewayRequest) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        for (name, value) in request.options().headers() {
            let value = HeaderValue::from_str(&value).map_err(|e| GatewayError::InvalidHeader {
                name,
                message: e.to_string(),
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayCaller {
    #[instrument(skip_all, fields(object = %request.object(), method = %request.method()))]
    async fn call(&self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let url = request.url(&self.config)?;
        let headers = Self::request_headers(request)?;
        debug!(%url, "Sending gateway request");

        let mut response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| GatewayError::transport(url.as_str(), e))?;

        let status = response.status();
        let charset = charset_from_headers(response.headers()).to_string();
        let correlation_id = correlation_id_from_headers(response.headers());

        // Chunks arrive in stream order; keep reading until end-of-stream.
        let mut buffer = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GatewayError::transport(url.as_str(), e))?
        {
            buffer.extend_from_slice(&chunk);
        }
        let body = decode_body(&buffer, &charset);

        if status != StatusCode::OK {
            return Err(GatewayError::application(status.as_u16(), body));
        }

        let value = parse_body(&body)?;
        debug!(
            status = status.as_u16(),
            bytes = buffer.len(),
            %charset,
            "Gateway call completed"
        );
        Ok(GatewayResponse {
            status: status.as_u16(),
            value,
            correlation_id,
            charset,
        })
    }
}

/// Resolves the body charset from the response's `Content-Type` header.
///
/// Returns `"utf-8"` when the header is missing, not valid ASCII, or carries
/// no `charset=` parameter.
pub fn charset_from_headers(headers: &HeaderMap) -> &str {
    resolve_charset(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
}

fn correlation_id_from_headers(headers: &HeaderMap) -> Option<CorrelationId> {
    let raw = headers.get(CORRELATION_ID_HEADER)?.to_str().ok()?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(value = raw, error = %e, "Ignoring malformed correlation id header");
            None
        }
    }
}
