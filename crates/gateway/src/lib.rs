//! Domain types for calling methods on remote objects through an HTTP object
//! gateway.
//!
//! The gateway maps `GET /<prefix>/<objectId>/<methodName>` onto a method call
//! on a remote object and answers with JSON. This crate describes such calls
//! and interprets their responses; it performs no I/O itself.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** Transports implement [`GatewayClient`]
//! (see the `gateway-http` crate); everything here is pure.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ObjectId`, `MethodName`, `CorrelationId`) |
//! | [`types`] | Endpoint config, request descriptor, call options, responses |
//! | [`body`] | Charset resolution, body decoding and JSON parsing |
//! | [`errors`] | [`GatewayError`] |
//! | [`client`] | The [`GatewayClient`] port and the [`dispatch`] adapter |

pub mod body;
pub mod client;
pub mod errors;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use body::{decode_body, parse_body, resolve_charset, DEFAULT_CHARSET};
pub use client::{dispatch, report_failure, GatewayClient};
pub use errors::GatewayError;
pub use identifiers::{CorrelationId, MethodName, ObjectId};
pub use types::{
    CallOptions, GatewayConfig, GatewayRequest, GatewayResponse, RemoteException,
    CORRELATION_ID_HEADER, GATEWAY_KEY_HEADER, OPTIONS_HEADER,
};

// Re-exported so implementors and callers agree on the JSON value type.
pub use serde_json::Value;
