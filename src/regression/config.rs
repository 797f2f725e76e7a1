// Configuration for the regression gate

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for regression detection against a stored baseline
///
/// # Example
/// ```
/// use perfgate::regression::RegressionConfig;
///
/// let config = RegressionConfig::default();
/// assert_eq!(config.tolerance, 3.0); // 3 historical standard deviations
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionConfig {
    /// How far a mean may worsen before it counts as a regression, in
    /// standard deviations of the stored baseline
    ///
    /// - 3.0 (default): ~0.3% false positive rate for normally distributed noise
    /// - 2.0: stricter, flags smaller slowdowns
    /// - 5.0: looser, for very noisy environments (shared CI runners)
    ///
    /// The comparison is strict: a worsening of exactly `tolerance * stddev`
    /// is still within tolerance.
    pub tolerance: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self { tolerance: 3.0 }
    }
}

impl RegressionConfig {
    /// Create a strict configuration (flags smaller slowdowns)
    pub fn strict() -> Self {
        Self { tolerance: 2.0 }
    }

    /// Create a permissive configuration for noisy machines
    pub fn permissive() -> Self {
        Self { tolerance: 5.0 }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(GateError::InvalidConfig(format!(
                "regression tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }

        Ok(())
    }
}
