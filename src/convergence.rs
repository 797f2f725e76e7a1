//! Convergence gate for repeated measurements
//!
//! A metric has converged when enough of its samples sit inside a sigma band
//! around the final mean: by default at least 95% strictly within 3 population
//! standard deviations. Only when every metric converges is a baseline
//! produced.

use crate::accumulator::{MetricSamples, StreamingStatsAccumulator};
use crate::baseline::{BaselineEntry, BaselineStore};
use crate::error::{GateError, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Thresholds for the convergence gate
///
/// # Example
/// ```
/// use perfgate::convergence::ConvergenceConfig;
///
/// let config = ConvergenceConfig::default();
/// assert_eq!(config.sigma, 3.0);
/// assert_eq!(config.acceptance, 0.95);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvergenceConfig {
    /// Half-width of the retention band, in population standard deviations
    pub sigma: f64,

    /// Minimum fraction of samples that must fall inside the band
    pub acceptance: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            acceptance: 0.95,
        }
    }
}

impl ConvergenceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(GateError::InvalidConfig(format!(
                "convergence sigma must be a positive number, got {}",
                self.sigma
            )));
        }

        if !(self.acceptance > 0.0 && self.acceptance <= 1.0) {
            return Err(GateError::InvalidConfig(format!(
                "convergence acceptance must be in (0, 1], got {}",
                self.acceptance
            )));
        }

        Ok(())
    }
}

/// A metric that failed the gate
#[derive(Debug, Clone, PartialEq)]
pub struct MetricShortfall {
    pub name: String,
    /// Samples strictly inside the band
    pub retained: u64,
    /// All samples of the metric
    pub total: u64,
}

impl MetricShortfall {
    /// Retained share as a percentage
    pub fn retained_percent(&self) -> f64 {
        self.retained as f64 / self.total as f64 * 100.0
    }
}

impl Serialize for MetricShortfall {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MetricShortfall", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("retained", &self.retained)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("retained_percent", &self.retained_percent())?;
        state.end()
    }
}

/// Outcome of the convergence gate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ConvergenceVerdict {
    /// Every metric converged; (mean, stddev) per metric
    Converged(BaselineStore),

    /// First metric (in name order) that did not reach the acceptance fraction
    NotConverged(MetricShortfall),
}

impl ConvergenceVerdict {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceVerdict::Converged(_))
    }
}

/// Count samples strictly within `sigma` population stddevs of the mean
///
/// Zero-spread metrics (a single sample, or identical samples) retain every
/// sample: their band has zero width and the strict comparison would
/// otherwise reject values equal to the mean.
pub fn retained_samples(samples: &MetricSamples, sigma: f64) -> u64 {
    let stats = &samples.stats;
    if stats.m2 == 0.0 {
        return stats.count;
    }

    let band = sigma * stats.stddev();
    samples
        .values
        .iter()
        .filter(|v| (**v - stats.mean).abs() < band)
        .count() as u64
}

/// Whether `retained / total` meets the acceptance fraction
pub fn meets_acceptance(retained: u64, total: u64, acceptance: f64) -> bool {
    if total == 0 {
        return true;
    }
    retained as f64 / total as f64 >= acceptance
}

/// Run the convergence gate over everything accumulated so far
///
/// Metrics are checked in ascending name order and the first shortfall ends
/// the evaluation.
///
/// # Errors
/// `GateError::InvalidConfig` if `config` does not validate.
pub fn evaluate_convergence(
    accumulator: &StreamingStatsAccumulator,
    config: &ConvergenceConfig,
) -> Result<ConvergenceVerdict> {
    config.validate()?;

    let mut baseline = BaselineStore::new();
    for (name, samples) in accumulator.iter() {
        let total = samples.stats.count;
        let retained = retained_samples(samples, config.sigma);

        tracing::debug!(
            "Metric {}: {}/{} samples within {} sigma (mean={}, stddev={})",
            name,
            retained,
            total,
            config.sigma,
            samples.stats.mean,
            samples.stats.stddev()
        );

        if !meets_acceptance(retained, total, config.acceptance) {
            return Ok(ConvergenceVerdict::NotConverged(MetricShortfall {
                name: name.to_string(),
                retained,
                total,
            }));
        }

        baseline.insert(
            name,
            BaselineEntry::new(samples.stats.mean, samples.stats.stddev()),
        );
    }

    Ok(ConvergenceVerdict::Converged(baseline))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(name: &str, values: &[f64]) -> StreamingStatsAccumulator {
        let mut acc = StreamingStatsAccumulator::new();
        for v in values {
            acc.observe(name, *v);
        }
        acc
    }

    /// `inside` zeros followed by `outliers` copies of 100
    fn zeros_with_outliers(inside: usize, outliers: usize) -> Vec<f64> {
        let mut values = vec![0.0; inside];
        values.extend(vec![100.0; outliers]);
        values
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConvergenceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_sigma = ConvergenceConfig {
            sigma: 0.0,
            ..Default::default()
        };
        assert!(bad_sigma.validate().is_err());

        let bad_acceptance = ConvergenceConfig {
            acceptance: 1.5,
            ..Default::default()
        };
        assert!(bad_acceptance.validate().is_err());

        let zero_acceptance = ConvergenceConfig {
            acceptance: 0.0,
            ..Default::default()
        };
        assert!(zero_acceptance.validate().is_err());
    }

    #[test]
    fn test_exactly_95_percent_converges() {
        // 19 of 20 samples inside the band; the single 100 lies 0.95*100 from
        // the mean while the band is ~0.65*100
        let acc = accumulate("latency", &zeros_with_outliers(19, 1));
        let samples = acc.get("latency").unwrap();
        assert_eq!(retained_samples(samples, 3.0), 19);

        let verdict = evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap();
        assert!(verdict.is_converged());
    }

    #[test]
    fn test_just_below_95_percent_does_not_converge() {
        // 37 of 39 retained: 94.87%
        let acc = accumulate("latency", &zeros_with_outliers(37, 2));
        let verdict = evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap();

        match verdict {
            ConvergenceVerdict::NotConverged(shortfall) => {
                assert_eq!(shortfall.name, "latency");
                assert_eq!(shortfall.retained, 37);
                assert_eq!(shortfall.total, 39);
                assert!(shortfall.retained_percent() < 95.0);
            }
            other => panic!("Expected NotConverged, got {:?}", other),
        }
    }

    #[test]
    fn test_acceptance_boundary() {
        assert!(meets_acceptance(95, 100, 0.95));
        assert!(meets_acceptance(19, 20, 0.95));
        assert!(!meets_acceptance(949, 1000, 0.95));
        assert!(!meets_acceptance(94, 100, 0.95));
    }

    #[test]
    fn test_single_sample_always_converges() {
        for value in [0.0, -12.5, 1e12] {
            let acc = accumulate("once", &[value]);
            match evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap() {
                ConvergenceVerdict::Converged(baseline) => {
                    assert_eq!(baseline.get("once"), Some(&BaselineEntry::new(value, 0.0)));
                }
                other => panic!("Expected Converged, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_identical_samples_converge() {
        let acc = accumulate("flat", &[7.0; 10]);
        let verdict = evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap();
        assert!(verdict.is_converged());
    }

    #[test]
    fn test_converged_baseline_carries_population_stddev() {
        let acc = accumulate("latency", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        match evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap() {
            ConvergenceVerdict::Converged(baseline) => {
                let entry = baseline.get("latency").unwrap();
                assert!((entry.mean - 5.0).abs() < 1e-12);
                assert!((entry.stddev - 2.0).abs() < 1e-12);
            }
            other => panic!("Expected Converged, got {:?}", other),
        }
    }

    #[test]
    fn test_first_failing_metric_in_name_order_is_reported() {
        let mut acc = StreamingStatsAccumulator::new();
        for v in zeros_with_outliers(37, 2) {
            acc.observe("zz_noisy", v);
            acc.observe("bb_noisy", v);
        }
        acc.observe("aa_stable", 1.0);

        match evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap() {
            ConvergenceVerdict::NotConverged(shortfall) => assert_eq!(shortfall.name, "bb_noisy"),
            other => panic!("Expected NotConverged, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_accumulator_converges_to_empty_baseline() {
        let acc = StreamingStatsAccumulator::new();
        match evaluate_convergence(&acc, &ConvergenceConfig::default()).unwrap() {
            ConvergenceVerdict::Converged(baseline) => assert!(baseline.is_empty()),
            other => panic!("Expected Converged, got {:?}", other),
        }
    }

    #[test]
    fn test_looser_acceptance_lets_noisy_metric_through() {
        let acc = accumulate("latency", &zeros_with_outliers(37, 2));
        let config = ConvergenceConfig {
            acceptance: 0.9,
            ..Default::default()
        };
        assert!(evaluate_convergence(&acc, &config).unwrap().is_converged());
    }
}
