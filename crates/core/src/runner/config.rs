//! Configuration for the runner module.

use serde::{Deserialize, Serialize};

/// Configuration for the batch runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Capacity of the event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Validate the converter before dispatching anything.
    #[serde(default = "default_validate_converter")]
    pub validate_converter: bool,
}

fn default_event_buffer() -> usize {
    256
}

fn default_validate_converter() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            validate_converter: default_validate_converter(),
        }
    }
}

impl RunnerConfig {
    /// Sets the event channel capacity.
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size.max(1);
        self
    }

    /// Enables or disables converter validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_converter = enabled;
        self
    }
}
