use std::path::PathBuf;

use clap::Parser;
use speculate::config::ExecutorConfig;
use speculate::ExecutorPolicy;

/// Dispatch todo items through an optimistic store and print every
/// projected state as a JSON line.
#[derive(Debug, Parser)]
#[command(name = "speculate", version)]
pub struct Args {
    /// Config file (default: ~/.config/speculate/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Executor policy: concurrent or serialized (overrides config)
    #[arg(long)]
    pub policy: Option<ExecutorPolicy>,

    /// Operation timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Simulated server latency per item in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 200)]
    pub latency_ms: u64,

    /// Item the simulated server rejects (repeatable)
    #[arg(long = "fail", value_name = "TEXT")]
    pub fail: Vec<String>,

    /// Todo items to dispatch, in order
    #[arg(required = true, value_name = "ITEM")]
    pub items: Vec<String>,
}

impl Args {
    /// File settings with command-line overrides applied.
    pub fn executor_config(&self, file: &ExecutorConfig) -> ExecutorConfig {
        ExecutorConfig {
            policy: self.policy.unwrap_or(file.policy),
            timeout_ms: self.timeout_ms.or(file.timeout_ms),
        }
    }
}
