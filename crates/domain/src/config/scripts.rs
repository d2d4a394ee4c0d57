use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptsConfig {
    /// Base directory for relative `script` references.
    #[serde(default)]
    pub directory: Option<String>,

    /// Command hooks still running after this many milliseconds are killed.
    #[serde(default = "default_script_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            timeout_ms: default_script_timeout_ms(),
        }
    }
}

fn default_script_timeout_ms() -> u64 {
    800
}
