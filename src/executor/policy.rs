use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How operations of dispatched actions are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorPolicy {
    /// Every operation starts as soon as its action is dispatched.
    #[default]
    Concurrent,
    /// Operations run one at a time in submission order.
    Serialized,
}

impl ExecutorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorPolicy::Concurrent => "concurrent",
            ExecutorPolicy::Serialized => "serialized",
        }
    }
}

impl fmt::Display for ExecutorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(ExecutorPolicy::Concurrent),
            "serialized" => Ok(ExecutorPolicy::Serialized),
            other => Err(format!(
                "unknown executor policy '{}' (expected 'concurrent' or 'serialized')",
                other
            )),
        }
    }
}
