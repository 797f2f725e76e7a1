//! CLI argument parsing for the convergence and acceptance tools

use crate::config::GateConfig;
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for verdict reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Decide whether repeated measurements have stabilized and write a baseline
#[derive(Parser, Debug)]
#[command(name = "perf-converge")]
#[command(version)]
#[command(
    about = "Check measurement convergence on stdin and write a baseline file",
    long_about = None
)]
pub struct ConvergeCli {
    /// Baseline file to write when every metric has converged
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// TOML configuration file ([convergence] table)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Retention band half-width in standard deviations (default: 3.0)
    #[arg(long = "sigma", value_name = "SIGMA")]
    pub sigma: Option<f64>,

    /// Minimum fraction of samples inside the band (default: 0.95)
    #[arg(long = "acceptance", value_name = "FRACTION")]
    pub acceptance: Option<f64>,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl ConvergeCli {
    /// Configuration file (if any) with command-line overrides applied
    pub fn gate_config(&self) -> Result<GateConfig> {
        let mut config = GateConfig::load_or_default(self.config.as_deref())?;
        if let Some(sigma) = self.sigma {
            config.convergence.sigma = sigma;
        }
        if let Some(acceptance) = self.acceptance {
            config.convergence.acceptance = acceptance;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Compare fresh results against the stored baseline and ratchet it
#[derive(Parser, Debug)]
#[command(name = "perf-accept")]
#[command(version)]
#[command(
    about = "Detect performance regressions against a reference baseline",
    long_about = None
)]
pub struct AcceptCli {
    /// Reference baseline; rewritten with improvements unless a regression is found
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// Freshly computed baseline to check
    #[arg(value_name = "CHECKED")]
    pub checked: PathBuf,

    /// TOML configuration file ([regression] table)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Allowed slowdown in reference standard deviations (default: 3.0)
    #[arg(long = "tolerance", value_name = "SIGMA")]
    pub tolerance: Option<f64>,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl AcceptCli {
    /// Configuration file (if any) with command-line overrides applied
    pub fn gate_config(&self) -> Result<GateConfig> {
        let mut config = GateConfig::load_or_default(self.config.as_deref())?;
        if let Some(tolerance) = self.tolerance {
            config.regression.tolerance = tolerance;
        }
        config.validate()?;
        Ok(config)
    }
}
