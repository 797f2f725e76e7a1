//! Perfgate - convergence and regression gates for performance measurements
//!
//! Two small pipelines share per-metric running statistics:
//!
//! - **Convergence**: a stream of `name:value` measurements is folded into
//!   online mean/variance estimates; once the stream ends, each metric must
//!   keep at least 95% of its samples within 3 standard deviations of its
//!   mean before a `(mean, stddev)` baseline file is written.
//! - **Acceptance**: freshly computed `(mean, stddev)` pairs are compared
//!   against a stored baseline; improvements ratchet the baseline, slowdowns
//!   beyond 3 historical standard deviations fail the run.

pub mod accumulator;
pub mod baseline;
pub mod cli;
pub mod config;
pub mod convergence;
pub mod error;
pub mod gate;
pub mod measurement;
pub mod regression;
pub mod report;

/// Initialize tracing subscriber for debug output
///
/// Logs go to stderr so stdout stays reserved for verdict reports. Enabled by
/// `--debug` (trace level) or by setting `RUST_LOG`.
pub fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}
