//! Ephemeral credential for the realtime transport
//!
//! A short-lived bearer token issued per session so the long-lived secret
//! never reaches the client.

use serde::{Deserialize, Serialize};

/// Ephemeral bearer token plus its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralCredential {
    /// The client secret value, used as a bearer token
    pub value: String,
    /// Expiry as a Unix timestamp (seconds)
    pub expires_at: i64,
}

impl EphemeralCredential {
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }
}
