// Per-metric regression verdicts and the ratcheting baseline update
//
// Lower is better. Improvements and new metrics replace the stored entry,
// tolerable slowdowns leave it alone, and the first slowdown beyond the
// tolerance band ends the check.

use crate::baseline::{BaselineEntry, BaselineStore};
use crate::error::Result;
use crate::regression::config::RegressionConfig;
use serde::Serialize;

/// Outcome for a single checked metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MetricVerdict {
    /// Not in the reference yet; checked entry becomes the baseline
    Adopted,

    /// Mean went down; checked entry replaces `previous`
    Improved { previous: BaselineEntry },

    /// Worse or equal, but within tolerance; reference kept
    WithinTolerance { reference: BaselineEntry },

    /// Worse by more than `tolerance * reference.stddev`
    Regressed { reference: BaselineEntry },
}

/// A checked metric together with its verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCheck {
    pub name: String,
    pub checked: BaselineEntry,
    #[serde(flatten)]
    pub verdict: MetricVerdict,
}

/// Result of checking a set of fresh results against the reference
#[derive(Debug, Clone, Serialize)]
pub struct RegressionReport {
    /// Metrics processed, in name order, up to and including a regression
    pub checks: Vec<MetricCheck>,

    /// Checked metrics never looked at because of an earlier regression
    pub skipped: usize,

    /// Reference baseline with every ratchet applied
    pub baseline: BaselineStore,

    /// Configuration used for the check
    pub config: RegressionConfig,
}

impl RegressionReport {
    /// The regressed metric, if the check was cut short by one
    pub fn regression(&self) -> Option<&MetricCheck> {
        self.checks
            .iter()
            .find(|check| matches!(check.verdict, MetricVerdict::Regressed { .. }))
    }

    pub fn is_regression(&self) -> bool {
        self.regression().is_some()
    }

    /// Number of metrics whose baseline entry was replaced
    pub fn ratcheted(&self) -> usize {
        self.checks
            .iter()
            .filter(|check| {
                matches!(
                    check.verdict,
                    MetricVerdict::Adopted | MetricVerdict::Improved { .. }
                )
            })
            .count()
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        for check in &self.checks {
            let name = &check.name;
            let new = check.checked.mean;
            match &check.verdict {
                MetricVerdict::Adopted => {
                    report.push_str(&format!(
                        "Metric {} adopted as new baseline: {} (stddev {})\n",
                        name, new, check.checked.stddev
                    ));
                }
                MetricVerdict::Improved { previous } => {
                    report.push_str(&format!(
                        "Metric {} improved from {} to {}; baseline updated\n",
                        name, previous.mean, new
                    ));
                }
                MetricVerdict::WithinTolerance { reference } => {
                    report.push_str(&format!(
                        "Metric {} is ok; value is {} against reference {} with sigma {}\n",
                        name, new, reference.mean, reference.stddev
                    ));
                }
                MetricVerdict::Regressed { reference } => {
                    report.push_str(&format!(
                        "Metric {} has worsened from {} to {} when stddev was {}\n",
                        name, reference.mean, new, reference.stddev
                    ));
                }
            }
        }

        if self.is_regression() {
            report.push_str("❌ Performance test failed.\n");
            if self.skipped > 0 {
                report.push_str(&format!(
                    "{} remaining metric(s) not checked\n",
                    self.skipped
                ));
            }
        } else {
            report.push_str(&format!(
                "✅ NO REGRESSION DETECTED ({} checked, {} baseline entries updated)\n",
                self.checks.len(),
                self.ratcheted()
            ));
        }

        report
    }
}

/// Check fresh results against the reference baseline
///
/// # Arguments
/// * `reference` - Historical baseline; updated in place and returned in the report
/// * `checked` - Freshly computed (mean, stddev) per metric
/// * `config` - Regression tolerance
///
/// # Example
/// ```
/// use perfgate::baseline::{BaselineEntry, BaselineStore};
/// use perfgate::regression::{check_regressions, RegressionConfig};
///
/// let mut reference = BaselineStore::new();
/// reference.insert("latency_ms", BaselineEntry::new(100.0, 2.0));
///
/// let mut checked = BaselineStore::new();
/// checked.insert("latency_ms", BaselineEntry::new(105.0, 1.0));
///
/// let report = check_regressions(reference, &checked, &RegressionConfig::default()).unwrap();
/// assert!(!report.is_regression());
/// assert_eq!(report.baseline.get("latency_ms").unwrap().mean, 100.0);
/// ```
pub fn check_regressions(
    mut reference: BaselineStore,
    checked: &BaselineStore,
    config: &RegressionConfig,
) -> Result<RegressionReport> {
    config.validate()?;

    let mut checks = Vec::with_capacity(checked.len());
    let mut skipped = 0;
    let mut regressed = false;

    for (name, &entry) in checked.iter() {
        if regressed {
            skipped += 1;
            continue;
        }

        let verdict = match reference.get(name).copied() {
            None => {
                reference.insert(name, entry);
                MetricVerdict::Adopted
            }
            Some(previous) if entry.mean < previous.mean => {
                reference.insert(name, entry);
                MetricVerdict::Improved { previous }
            }
            Some(previous) if entry.mean - previous.mean > config.tolerance * previous.stddev => {
                tracing::warn!(
                    "Metric {} regressed: {} -> {} (stddev {})",
                    name,
                    previous.mean,
                    entry.mean,
                    previous.stddev
                );
                MetricVerdict::Regressed {
                    reference: previous,
                }
            }
            Some(previous) => MetricVerdict::WithinTolerance {
                reference: previous,
            },
        };

        tracing::debug!("Metric {}: {:?}", name, verdict);
        regressed = matches!(verdict, MetricVerdict::Regressed { .. });
        checks.push(MetricCheck {
            name: name.to_string(),
            checked: entry,
            verdict,
        });
    }

    Ok(RegressionReport {
        checks,
        skipped,
        baseline: reference,
        config: *config,
    })
}
