//! Gate configuration loaded from TOML
//!
//! Both tools accept `--config <FILE>`. Every table and key is optional:
//!
//! ```toml
//! [convergence]
//! sigma = 3.0
//! acceptance = 0.95
//!
//! [regression]
//! tolerance = 3.0
//! ```

use crate::convergence::ConvergenceConfig;
use crate::error::{GateError, Result};
use crate::regression::RegressionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Combined configuration for both gates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub convergence: ConvergenceConfig,
    pub regression: RegressionConfig,
}

impl GateConfig {
    /// Load a configuration file without range checks
    ///
    /// Values are validated by the caller once command-line overrides have
    /// been applied.
    ///
    /// # Errors
    /// `GateError::MissingFile` if the file does not exist,
    /// `GateError::InvalidConfig` for bad TOML or unknown keys.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GateError::MissingFile(path.to_path_buf()),
            _ => GateError::Io(e),
        })?;

        let config = Self::parse_toml(&content)?;
        tracing::debug!("Loaded gate configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Self::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GateError::InvalidConfig(format!("failed to parse TOML: {}", e)))
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.convergence.validate()?;
        self.regression.validate()
    }
}
