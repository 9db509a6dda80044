//! Turning a buffered response body into a JSON value.
//!
//! Three steps, each usable on its own: find the charset in `Content-Type`
//! ([`resolve_charset`]), decode the bytes with it ([`decode_body`]), and parse
//! the text ([`parse_body`]).

use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use tracing::warn;

use crate::GatewayError;

/// Charset assumed when the response does not name one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Returns the `charset` parameter of a `Content-Type` value, or
/// [`DEFAULT_CHARSET`] if there is no header or no usable parameter.
///
/// The parameter name is matched case-insensitively and the value runs up to
/// the next `;`, `,` or line break. Surrounding whitespace and double quotes
/// are stripped.
///
/// ```
/// use gateway::resolve_charset;
///
/// assert_eq!(resolve_charset(Some("application/json; charset=ISO-8859-1")), "ISO-8859-1");
/// assert_eq!(resolve_charset(Some("application/json")), "utf-8");
/// assert_eq!(resolve_charset(None), "utf-8");
/// ```
pub fn resolve_charset(content_type: Option<&str>) -> &str {
    content_type
        .and_then(charset_parameter)
        .unwrap_or(DEFAULT_CHARSET)
}

fn charset_parameter(content_type: &str) -> Option<&str> {
    const KEY: &str = "charset=";
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let start = content_type.to_ascii_lowercase().find(KEY)? + KEY.len();
    let rest = &content_type[start..];
    let end = rest.find([';', ',', '\r', '\n']).unwrap_or(rest.len());
    let value = rest[..end].trim().trim_matches('"').trim();
    (!value.is_empty()).then_some(value)
}

/// Decodes a response body using the named charset.
///
/// Unknown charset labels fall back to UTF-8. Byte sequences that are invalid
/// in the chosen encoding are replaced with U+FFFD rather than failing.
pub fn decode_body(bytes: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).unwrap_or_else(|| {
        warn!(charset, "Unknown response charset, decoding as utf-8");
        UTF_8
    });
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = actual.name(),
            "Response body contained invalid byte sequences"
        );
    }
    text.into_owned()
}

/// Parses a decoded body as JSON.
///
/// An empty or whitespace-only body yields [`Value::Null`]. Malformed JSON is
/// reported as [`GatewayError::Parse`] with the offending body attached.
pub fn parse_body(text: &str) -> Result<Value, GatewayError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|source| GatewayError::Parse {
        source,
        body: text.to_string(),
    })
}
