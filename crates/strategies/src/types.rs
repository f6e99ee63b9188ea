// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SmaCrossoverSettings {
    /// Number of samples averaged by the SMA.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for SmaCrossoverSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

fn default_window() -> usize {
    14
}
