//! Pacing configuration for streamed replies.

use std::time::Duration;

use crate::error::{CoalescerError, Result};

/// Default minimum interval between message edits.
pub const DEFAULT_EDIT_INTERVAL_SECS: u64 = 3;
/// Default interval between typing notifications before the first send.
pub const DEFAULT_TYPING_INTERVAL_SECS: u64 = 3;
/// Default number of tokens that forces the first send without waiting for a tick.
pub const DEFAULT_FIRST_TOKEN_THRESHOLD: u32 = 5;

/// Pacing for one streamed reply: edit cadence, typing cadence, and the token
/// count that forces the first send.
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// Minimum interval between edits of the outgoing message.
    pub edit_interval: Duration,
    /// Interval between typing notifications while no text is visible yet.
    pub typing_interval: Duration,
    /// Number of accumulated tokens that forces the first send immediately,
    /// without waiting for the next edit tick.
    pub first_token_threshold: u32,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            edit_interval: Duration::from_secs(DEFAULT_EDIT_INTERVAL_SECS),
            typing_interval: Duration::from_secs(DEFAULT_TYPING_INTERVAL_SECS),
            first_token_threshold: DEFAULT_FIRST_TOKEN_THRESHOLD,
        }
    }
}

impl CoalescerConfig {
    /// Builds a config from whole-second intervals.
    pub fn from_secs(edit_secs: u64, typing_secs: u64, first_token_threshold: u32) -> Self {
        Self {
            edit_interval: Duration::from_secs(edit_secs),
            typing_interval: Duration::from_secs(typing_secs),
            first_token_threshold,
        }
    }

    /// Rejects zero intervals and a zero threshold; the session timers need a
    /// positive period.
    pub fn validate(&self) -> Result<()> {
        if self.edit_interval.is_zero() {
            return Err(CoalescerError::InvalidConfig(
                "edit_interval must be positive".to_string(),
            ));
        }
        if self.typing_interval.is_zero() {
            return Err(CoalescerError::InvalidConfig(
                "typing_interval must be positive".to_string(),
            ));
        }
        if self.first_token_threshold == 0 {
            return Err(CoalescerError::InvalidConfig(
                "first_token_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
