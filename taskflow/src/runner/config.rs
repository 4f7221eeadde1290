//! Runner configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory importance hint for a run.
///
/// Recorded on the task context and in spawn logs. The hint does not
/// change scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background work.
    Low,
    /// Ordinary work.
    Normal,
    /// Latency-sensitive work.
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Configuration shared by all runners.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Human-readable name for diagnostics.
    pub name: Option<String>,
    /// Advisory priority hint.
    pub priority: Priority,
}

impl RunConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the diagnostic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the priority hint.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}
