//! Bitmap layer configuration.

use std::path::Path;

use bitkv_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

/// Scratch key used for derived bitwise operations when none is configured.
///
/// Every [`crate::Bitmap`] built with the default configuration shares this
/// key, so concurrent derived operations against the same store can race on
/// it. Callers needing concurrency should configure distinct scratch keys or
/// use distinct aggregation destinations.
pub const DEFAULT_SCRATCH_KEY: &str = "__bitkv_scratch__";

/// Configuration of a [`crate::Bitmap`].
///
/// Deserializes from JSON; missing fields take their default values:
///
/// ```json
/// { "scratch_key": "reports:tmp" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitmapConfig {
    /// Key holding intermediate reduction results. It is created and deleted
    /// within the same transaction by every derived operation.
    pub scratch_key: String,
}

impl Default for BitmapConfig {
    fn default() -> Self {
        BitmapConfig {
            scratch_key: DEFAULT_SCRATCH_KEY.to_string(),
        }
    }
}

impl BitmapConfig {
    pub fn with_scratch_key(scratch_key: impl Into<String>) -> Result<BitmapConfig> {
        let config = BitmapConfig {
            scratch_key: scratch_key.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scratch_key.is_empty() {
            return Err(Error::configuration("scratch_key must not be empty"));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<BitmapConfig> {
        let config: BitmapConfig = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid bitmap config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<BitmapConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}
