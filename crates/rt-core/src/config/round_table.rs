//! Round-table run configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;
use super::ChildSpec;

/// Default display name for operator lines
pub const DEFAULT_OPERATOR_NAME: &str = "user";

/// Default synthetic prompt used to kick off the autonomous loop
pub const DEFAULT_LOOP_PROMPT: &str = "continue the conversation";

/// Configuration for one round-table run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTableConfig {
    /// Name operator lines are tagged with when quoted to children
    #[serde(alias = "operatorName", alias = "OperatorName")]
    pub operator_name: String,

    /// Autonomous loop settings
    #[serde(alias = "Scheduler")]
    pub scheduler: SchedulerConfig,

    /// Children in registration order
    #[serde(alias = "Children")]
    pub children: Vec<ChildSpec>,
}

impl Default for RoundTableConfig {
    fn default() -> Self {
        Self {
            operator_name: DEFAULT_OPERATOR_NAME.to_string(),
            scheduler: SchedulerConfig::default(),
            children: Vec::new(),
        }
    }
}

impl RoundTableConfig {
    /// Create a config for the given children with default settings
    pub fn with_children(children: Vec<ChildSpec>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }
}

/// Timing of the autonomous round-robin loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause between scheduling attempts
    #[serde(rename = "tick_ms", alias = "tickMs", with = "duration_millis")]
    pub tick: Duration,

    /// How long to wait for a `stop` after each delivery
    #[serde(rename = "stop_window_ms", alias = "stopWindowMs", with = "duration_millis")]
    pub stop_window: Duration,

    /// Operator line appended when the loop starts
    pub prompt: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            stop_window: Duration::from_secs(2),
            prompt: DEFAULT_LOOP_PROMPT.to_string(),
        }
    }
}
