//! End-to-end runs of both gates: read inputs, decide, persist
//!
//! Inputs are read completely before any decision is made, and a baseline is
//! written at most once, at the very end.

use crate::accumulator::StreamingStatsAccumulator;
use crate::baseline::BaselineStore;
use crate::convergence::{evaluate_convergence, ConvergenceConfig, ConvergenceVerdict};
use crate::error::{ExitStatus, GateError, Result};
use crate::regression::{check_regressions, RegressionConfig, RegressionReport};
use std::io::BufRead;
use std::path::Path;

/// Ingest a measurement stream and write `output` if every metric converged
///
/// # Errors
/// - `GateError::InputFormat` on the first malformed measurement line
/// - `GateError::EmptyBaseline` if the stream held no measurements at all
/// - `GateError::Io` if reading or writing fails
pub fn run_convergence<R: BufRead>(
    reader: R,
    output: &Path,
    config: &ConvergenceConfig,
) -> Result<ConvergenceVerdict> {
    let mut accumulator = StreamingStatsAccumulator::new();
    accumulator.ingest_reader(reader)?;

    let verdict = evaluate_convergence(&accumulator, config)?;
    match &verdict {
        ConvergenceVerdict::Converged(baseline) if baseline.is_empty() => {
            return Err(GateError::EmptyBaseline(output.to_path_buf()));
        }
        ConvergenceVerdict::Converged(baseline) => baseline.save(output)?,
        ConvergenceVerdict::NotConverged(shortfall) => {
            tracing::info!(
                "Metric {} not converged; {} left untouched",
                shortfall.name,
                output.display()
            );
        }
    }

    Ok(verdict)
}

/// Check `checked` against `reference` and rewrite `reference` on success
///
/// The reference file is left unmodified when a regression is detected.
///
/// # Errors
/// - `GateError::MissingFile` / `GateError::BaselineFormat` while loading
/// - `GateError::EmptyBaseline` if the updated reference has no entries
/// - `GateError::Io` if writing fails
pub fn run_acceptance(
    reference: &Path,
    checked: &Path,
    config: &RegressionConfig,
) -> Result<RegressionReport> {
    let reference_store = BaselineStore::load(reference)?;
    let checked_store = BaselineStore::load(checked)?;
    tracing::debug!(
        "Checking {} metric(s) against {} reference entries",
        checked_store.len(),
        reference_store.len()
    );

    let report = check_regressions(reference_store, &checked_store, config)?;
    if report.is_regression() {
        return Ok(report);
    }

    if report.baseline.is_empty() {
        return Err(GateError::EmptyBaseline(reference.to_path_buf()));
    }
    report.baseline.save(reference)?;

    Ok(report)
}

impl ConvergenceVerdict {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ConvergenceVerdict::Converged(_) => ExitStatus::Success,
            ConvergenceVerdict::NotConverged(_) => ExitStatus::NotConverged,
        }
    }
}

impl RegressionReport {
    pub fn exit_status(&self) -> ExitStatus {
        if self.is_regression() {
            ExitStatus::RegressionDetected
        } else {
            ExitStatus::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineEntry;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_run_convergence_writes_baseline() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("baseline.tsv");
        let input = "latency:10\nlatency:12\nlatency:11\nrps:500\n";

        let verdict =
            run_convergence(Cursor::new(input), &output, &ConvergenceConfig::default()).unwrap();

        assert_eq!(verdict.exit_status(), ExitStatus::Success);
        let written = BaselineStore::load(&output).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written.get("latency").unwrap().mean, 11.0);
        assert_eq!(written.get("rps"), Some(&BaselineEntry::new(500.0, 0.0)));
    }

    #[test]
    fn test_run_convergence_not_converged_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("baseline.tsv");
        let mut input = "latency:0\n".repeat(37);
        input.push_str("latency:100\nlatency:100\n");

        let verdict =
            run_convergence(Cursor::new(input), &output, &ConvergenceConfig::default()).unwrap();

        assert_eq!(verdict.exit_status(), ExitStatus::NotConverged);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_convergence_empty_stream() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("baseline.tsv");

        let err = run_convergence(Cursor::new(""), &output, &ConvergenceConfig::default())
            .unwrap_err();
        assert!(matches!(err, GateError::EmptyBaseline(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_convergence_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.tsv");
        let second = dir.path().join("second.tsv");
        let input = "b:1.5\na:3\nb:2.25\na:4\nb:1.75\n";

        run_convergence(Cursor::new(input), &first, &ConvergenceConfig::default()).unwrap();
        run_convergence(Cursor::new(input), &second, &ConvergenceConfig::default()).unwrap();

        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_run_acceptance_regression_leaves_reference_untouched() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.tsv");
        let checked = dir.path().join("checked.tsv");
        fs::write(&reference, "latency_ms\t100.0\t2.0\n").unwrap();
        fs::write(&checked, "latency_ms\t107.5\t1.8\n").unwrap();

        let report = run_acceptance(&reference, &checked, &RegressionConfig::default()).unwrap();

        assert_eq!(report.exit_status(), ExitStatus::RegressionDetected);
        assert_eq!(
            fs::read_to_string(&reference).unwrap(),
            "latency_ms\t100.0\t2.0\n"
        );
    }

    #[test]
    fn test_run_acceptance_ratchets_reference() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.tsv");
        let checked = dir.path().join("checked.tsv");
        fs::write(&reference, "latency_ms\t100.0\t2.0\nrps\t10\t1\n").unwrap();
        fs::write(&checked, "latency_ms\t90.0\t1.0\nstartup\t5\t0.5\n").unwrap();

        let report = run_acceptance(&reference, &checked, &RegressionConfig::default()).unwrap();

        assert_eq!(report.exit_status(), ExitStatus::Success);
        assert_eq!(
            fs::read_to_string(&reference).unwrap(),
            "latency_ms\t90.0\t1.0\nrps\t10.0\t1.0\nstartup\t5.0\t0.5\n"
        );
    }

    #[test]
    fn test_run_acceptance_empty_baseline() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.tsv");
        let checked = dir.path().join("checked.tsv");
        fs::write(&reference, "").unwrap();
        fs::write(&checked, "").unwrap();

        let err = run_acceptance(&reference, &checked, &RegressionConfig::default()).unwrap_err();
        assert!(matches!(err, GateError::EmptyBaseline(_)));
    }

    #[test]
    fn test_run_acceptance_missing_reference() {
        let dir = TempDir::new().unwrap();
        let checked = dir.path().join("checked.tsv");
        fs::write(&checked, "a\t1\t1\n").unwrap();

        let err = run_acceptance(
            &dir.path().join("missing.tsv"),
            &checked,
            &RegressionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::MissingFile(_)));
    }
}
