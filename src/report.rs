//! Rendering of gate outcomes for stdout

use crate::cli::OutputFormat;
use crate::convergence::ConvergenceVerdict;
use crate::regression::RegressionReport;
use anyhow::{Context, Result};

/// Human-readable convergence outcome
pub fn convergence_text(verdict: &ConvergenceVerdict) -> String {
    match verdict {
        ConvergenceVerdict::Converged(baseline) => {
            let mut out = format!("✅ All {} metric(s) converged\n", baseline.len());
            for (name, entry) in baseline.iter() {
                out.push_str(&format!(
                    "  {} mean={} stddev={}\n",
                    name, entry.mean, entry.stddev
                ));
            }
            out
        }
        ConvergenceVerdict::NotConverged(shortfall) => format!(
            "{} has not reached convergence. Only {} samples were valid over {} [{:.2}%]\n",
            shortfall.name,
            shortfall.retained,
            shortfall.total,
            shortfall.retained_percent()
        ),
    }
}

/// Render a convergence outcome in the requested format
pub fn render_convergence(verdict: &ConvergenceVerdict, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(convergence_text(verdict)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(verdict)
                .context("Failed to serialize convergence verdict")?;
            Ok(json + "\n")
        }
    }
}

/// Render a regression report in the requested format
pub fn render_regression(report: &RegressionReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(report.to_report_string()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .context("Failed to serialize regression report")?;
            Ok(json + "\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{BaselineEntry, BaselineStore};
    use crate::convergence::MetricShortfall;

    #[test]
    fn test_not_converged_text_names_metric() {
        let verdict = ConvergenceVerdict::NotConverged(MetricShortfall {
            name: "latency".to_string(),
            retained: 37,
            total: 39,
        });
        let text = convergence_text(&verdict);
        assert!(text.contains("latency has not reached convergence"));
        assert!(text.contains("Only 37 samples were valid over 39"));
        assert!(text.contains("[94.87%]"));
    }

    #[test]
    fn test_converged_text_lists_metrics() {
        let mut baseline = BaselineStore::new();
        baseline.insert("latency", BaselineEntry::new(12.5, 0.5));
        let text = convergence_text(&ConvergenceVerdict::Converged(baseline));
        assert!(text.contains("All 1 metric(s) converged"));
        assert!(text.contains("latency mean=12.5 stddev=0.5"));
    }

    #[test]
    fn test_convergence_json_is_tagged() {
        let verdict = ConvergenceVerdict::NotConverged(MetricShortfall {
            name: "latency".to_string(),
            retained: 1,
            total: 2,
        });
        let json = render_convergence(&verdict, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "not_converged");
        assert_eq!(value["detail"]["name"], "latency");
        assert_eq!(value["detail"]["retained"], 1);
        assert_eq!(value["detail"]["total"], 2);
        assert_eq!(value["detail"]["retained_percent"], 50.0);
    }
}
