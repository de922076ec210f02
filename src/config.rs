use super::*;
use crate::runtime_state::TraceConfig;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;
pub(crate) const DEFAULT_DOWNLOAD_FILENAME: &str = "modified_test_plan.jmx";
pub(crate) const DEFAULT_VARIABLES_NAME: &str = "User Defined Variables";

/// Settings for a [`crate::PlanEditor`]. Every field has a default, so a
/// partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Files above this size are rejected before parsing.
    pub max_input_bytes: u64,
    pub download_filename: String,
    /// Name given to the variables container when it is renamed to blank.
    pub default_variables_name: String,
    pub trace: TraceConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
            default_variables_name: DEFAULT_VARIABLES_NAME.to_string(),
            trace: TraceConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_input_bytes == 0 {
            return Err(Error::Config("max_input_bytes must be at least 1".into()));
        }
        if self.download_filename.trim().is_empty() {
            return Err(Error::Config("download_filename must not be empty".into()));
        }
        if self.default_variables_name.trim().is_empty() {
            return Err(Error::Config("default_variables_name must not be empty".into()));
        }
        if self.trace.log_limit == 0 {
            return Err(Error::Config("trace.log_limit must be at least 1".into()));
        }
        Ok(())
    }
}
