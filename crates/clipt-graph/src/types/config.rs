use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_STEPS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphConfig {
    /// Node executions allowed per run before it fails
    pub max_steps: usize,
    /// Wall-clock bound on a whole run; `None` means unbounded
    #[serde(default)]
    pub execution_timeout: Option<Duration>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            execution_timeout: None,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }
}
