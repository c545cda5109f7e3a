//! Dispatch configuration.
//!
//! Every knob a delivery depends on lives in [`DispatchConfig`], which is
//! handed to the [`crate::Dispatcher`] explicitly. There is no process-wide
//! dial policy.

use crate::wire::DEFAULT_MAX_FRAME_LEN;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the caller's deadline is spread over the dial and call phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBudget {
    /// One budget for the whole attempt: the call only gets what dialing
    /// left over.
    #[default]
    Shared,
    /// Dial and call each get the full deadline, so an attempt can take up
    /// to twice the deadline.
    PerPhase,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_frame_len must be positive")]
    ZeroFrameLen,
    #[error("max_frame_len {0} does not fit the u32 length prefix")]
    FrameLenTooLarge(usize),
}

/// Configuration for a [`crate::Dispatcher`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline split between dial and call.
    pub budget: DeadlineBudget,
    /// Largest frame body sent or accepted.
    pub max_frame_len: usize,
    /// Disable Nagle on dialed sockets.
    pub nodelay: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            budget: DeadlineBudget::Shared,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            nodelay: true,
        }
    }
}

impl DispatchConfig {
    pub fn with_budget(mut self, budget: DeadlineBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len == 0 {
            return Err(ConfigError::ZeroFrameLen);
        }
        if self.max_frame_len > u32::MAX as usize {
            return Err(ConfigError::FrameLenTooLarge(self.max_frame_len));
        }
        Ok(())
    }
}
