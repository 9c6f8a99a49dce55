//! Token-usage counters
//!
//! The transport adapter accumulates these from the figures the remote
//! service reports; everything downstream treats them as a read-only mirror.

use serde::{Deserialize, Serialize};

/// Cumulative usage for one session. Counters never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of completed response cycles
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Fold one completed response's accounting into the running totals.
    pub fn record_response(&mut self, input_tokens: u64, output_tokens: u64, total_tokens: u64) {
        self.requests += 1;
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.total_tokens += total_tokens;
    }
}
