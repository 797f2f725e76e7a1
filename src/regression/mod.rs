//! Regression gate with baseline ratcheting
//!
//! Compares freshly measured (mean, stddev) pairs against the stored
//! historical baseline. Lower means are better (latencies, durations):
//!
//! - metric not in the baseline, or mean improved: adopt it (ratchet forward)
//! - mean worse by more than `tolerance` historical stddevs: regression, stop
//! - otherwise: within tolerance, baseline unchanged
//!
//! The first regression short-circuits the run; later metrics are not looked at
//! and the baseline file must not be rewritten.

mod config;
mod verdict;

pub use config::RegressionConfig;
pub use verdict::{check_regressions, MetricCheck, MetricVerdict, RegressionReport};
