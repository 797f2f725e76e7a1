//! Streaming per-metric statistics
//!
//! Single-pass mean/variance (Welford's online update) keyed by metric name.
//! Raw values are retained per metric as well, because the convergence gate
//! makes a second pass over them against the final mean.

use crate::measurement::Observation;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Running mean and sum of squared deviations for one metric
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    /// Number of observations folded in so far
    pub count: u64,
    /// Running average
    pub mean: f64,
    /// Running sum of squared deviations from the mean
    pub m2: f64,
}

impl RunningStats {
    /// Create empty statistics (count = 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value into the running statistics
    ///
    /// The second product uses the already-updated mean, which keeps `m2`
    /// non-negative under rounding.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Population variance (`m2 / count`), 0 when nothing was observed
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.m2 / self.count as f64
    }

    /// Population standard deviation
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Statistics plus the ordered raw values of one metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSamples {
    pub stats: RunningStats,
    pub values: Vec<f64>,
}

impl MetricSamples {
    fn push(&mut self, value: f64) {
        self.stats.push(value);
        self.values.push(value);
    }
}

/// Per-metric accumulator for a stream of `(name, value)` observations
///
/// Metrics are kept in a `BTreeMap`, so iteration is in ascending name order
/// and two runs over the same stream visit metrics identically.
#[derive(Debug, Default)]
pub struct StreamingStatsAccumulator {
    metrics: BTreeMap<String, MetricSamples>,
}

impl StreamingStatsAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation for `name`
    pub fn observe(&mut self, name: &str, value: f64) {
        if let Some(samples) = self.metrics.get_mut(name) {
            samples.push(value);
        } else {
            let mut samples = MetricSamples::default();
            samples.push(value);
            self.metrics.insert(name.to_string(), samples);
        }
    }

    /// Record a parsed observation
    pub fn ingest(&mut self, observation: &Observation) {
        self.observe(&observation.name, observation.value);
    }

    /// Read `name:value` lines until end of stream
    ///
    /// The first malformed line aborts the whole read; nothing after it is
    /// consumed.
    ///
    /// # Errors
    /// `GateError::InputFormat` for an unparsable line, `GateError::Io` when
    /// the reader fails.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R) -> crate::error::Result<usize> {
        let mut ingested = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let observation = Observation::parse_line(index + 1, &line)?;
            self.ingest(&observation);
            ingested += 1;
        }
        tracing::debug!(
            "Ingested {} observations across {} metrics",
            ingested,
            self.metrics.len()
        );
        Ok(ingested)
    }

    /// Statistics and raw values for one metric
    pub fn get(&self, name: &str) -> Option<&MetricSamples> {
        self.metrics.get(name)
    }

    /// All metrics in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSamples)> {
        self.metrics.iter().map(|(name, samples)| (name.as_str(), samples))
    }

    /// Number of distinct metrics observed
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
