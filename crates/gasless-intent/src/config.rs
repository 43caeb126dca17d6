//! orchestrator configuration

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// wait between status polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// ~3 minutes at the default interval
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// consecutive 404s on the status endpoint before giving up
pub const DEFAULT_NOT_FOUND_THRESHOLD: u32 = 5;

/// blocks added to the head for `recent_block`, covering head races
pub const DEFAULT_RECENT_BLOCK_BUFFER: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// relayer api base url
    pub api_url: String,
    /// contract the eip-7702 authorization delegates to
    pub delegate: Address,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub not_found_threshold: u32,
    pub recent_block_buffer: u64,
}

impl OrchestratorConfig {
    pub fn new(api_url: impl Into<String>, delegate: Address) -> Self {
        Self {
            api_url: api_url.into(),
            delegate,
            ..Self::default()
        }
    }

    /// never zero; tokio intervals reject a zero period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".into(),
            delegate: Address::ZERO,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            not_found_threshold: DEFAULT_NOT_FOUND_THRESHOLD,
            recent_block_buffer: DEFAULT_RECENT_BLOCK_BUFFER,
        }
    }
}
