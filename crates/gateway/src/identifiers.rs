//! Newtype identifiers for gateway calls.
//!
//! The gateway addresses every invocation by an object name and a method name.
//! Both are carried as distinct newtypes so that a call site cannot swap them
//! by accident, even though both are plain strings on the wire.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Name under which the remote object is registered with the gateway
    /// (e.g. `"Pyro.NameServer"`).
    ObjectId
}

string_id! {
    /// Method (or attribute) to invoke on the remote object.
    ///
    /// The name may carry an embedded query string, e.g. `"lookup?name=X"`;
    /// [`MethodName::name`] and [`MethodName::query`] split the two parts.
    /// The special name `"$meta"` asks the gateway for the object's metadata.
    MethodName
}

impl MethodName {
    /// Returns the method name without any embedded query string.
    pub fn name(&self) -> &str {
        self.0.split_once('?').map_or(self.0.as_str(), |(name, _)| name)
    }

    /// Returns the embedded query string, if the name carries one.
    pub fn query(&self) -> Option<&str> {
        self.0.split_once('?').map(|(_, query)| query)
    }
}

// ---------------------------------------------------------------------------
// Correlation ids
// ---------------------------------------------------------------------------

/// Correlates one gateway call with the activity it causes on the remote side.
///
/// Sent in the `X-Pyro-Correlation-Id` request header when set, and echoed back
/// by the gateway on successful responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generates a new random correlation id.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`CorrelationId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
