//! HTTP transport for the object gateway.
//!
//! Implements the [`gateway::GatewayClient`] trait with [`HttpGatewayCaller`],
//! which sends one HTTP/1.1 GET per call, buffers the response body until
//! end-of-stream, decodes it with the charset named in `Content-Type`, and
//! parses it as JSON.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, header encoding and body streaming
//! live here. The [`gateway`] crate sees only [`gateway::GatewayClient`].
//!
//! ## Example
//!
//! ```no_run
//! use gateway::GatewayConfig;
//! use gateway_http::HttpGatewayCaller;
//!
//! # async fn run() -> Result<(), gateway::GatewayError> {
//! let caller = HttpGatewayCaller::new(GatewayConfig::new("localhost", 8080))?;
//! caller
//!     .call_with("Pyro.NameServer", "lookup?name=Pyro.NameServer", |value| {
//!         println!("{value:#}");
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

mod caller;

pub use caller::{charset_from_headers, HttpGatewayCaller};
