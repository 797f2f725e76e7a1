//! Measurement lines: parsing on the gate side, recording on the harness side
//!
//! Wire format is one observation per line, `<metric-name>:<value>`. The
//! benchmark harness prints `[PERF]<name>: <average>`, so the prefix is part
//! of the metric name and the value may carry surrounding whitespace.

use crate::accumulator::RunningStats;
use crate::error::{GateError, Result};
use std::io::Write;

/// Prefix the benchmark harness puts in front of every reported metric
pub const PERF_PREFIX: &str = "[PERF]";

/// One `(name, value)` observation
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub name: String,
    pub value: f64,
}

impl Observation {
    /// Parse a single `name:value` line
    ///
    /// `line_number` is 1-based and only used for the diagnostic.
    ///
    /// # Errors
    /// `GateError::InputFormat` when the line does not split into exactly two
    /// fields, the name is empty or holds a tab, or the value is not a finite
    /// number.
    ///
    /// # Example
    /// ```
    /// use perfgate::measurement::Observation;
    ///
    /// let obs = Observation::parse_line(1, "[PERF]cache_get: 12.5").unwrap();
    /// assert_eq!(obs.name, "[PERF]cache_get");
    /// assert_eq!(obs.value, 12.5);
    /// ```
    pub fn parse_line(line_number: usize, line: &str) -> Result<Self> {
        let malformed = |reason: &str| GateError::InputFormat {
            line: line_number,
            content: line.to_string(),
            reason: reason.to_string(),
        };

        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut fields = line.split(':');
        let (Some(name), Some(raw_value), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("expected exactly one ':' separating <name>:<value>"));
        };

        if name.is_empty() {
            return Err(malformed("empty metric name"));
        }
        if name.contains('\t') {
            return Err(malformed("metric name contains a tab"));
        }

        let value: f64 = raw_value
            .trim()
            .parse()
            .map_err(|_| malformed("value is not a number"))?;
        if !value.is_finite() {
            return Err(malformed("value is not finite"));
        }

        Ok(Self {
            name: name.to_string(),
            value,
        })
    }
}

/// Harness-side recorder for one named measurement
///
/// Applies the same online update as the gate, so the harness can print the
/// running average of a test run as a single `[PERF]` line.
#[derive(Debug, Clone)]
pub struct Measurement {
    name: String,
    stats: RunningStats,
    values: Vec<f64>,
}

impl Measurement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: RunningStats::new(),
            values: Vec::new(),
        }
    }

    /// Record one sample
    pub fn put(&mut self, value: impl Into<f64>) {
        let value = value.into();
        self.stats.push(value);
        self.values.push(value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u64 {
        self.stats.count
    }

    pub fn average(&self) -> f64 {
        self.stats.mean
    }

    pub fn variance(&self) -> f64 {
        self.stats.variance()
    }

    pub fn stddev(&self) -> f64 {
        self.stats.stddev()
    }

    /// Samples in recording order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `[PERF]<name>: <average>`
    pub fn report_line(&self) -> String {
        format!("{}{}: {}", PERF_PREFIX, self.name, self.stats.mean)
    }

    /// Write the report line followed by a newline
    pub fn write_report<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", self.report_line())?;
        Ok(())
    }
}
