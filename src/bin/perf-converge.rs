use anyhow::{Context, Result};
use clap::Parser;
use perfgate::cli::ConvergeCli;
use perfgate::error::ExitStatus;
use perfgate::{gate, report};
use std::io;
use std::process::ExitCode;

fn run(args: &ConvergeCli) -> Result<ExitStatus> {
    let config = args.gate_config().context("Failed to load configuration")?;

    let stdin = io::stdin();
    let verdict = gate::run_convergence(stdin.lock(), &args.output, &config.convergence)
        .with_context(|| format!("Convergence run for {} failed", args.output.display()))?;

    print!("{}", report::render_convergence(&verdict, args.format)?);
    Ok(verdict.exit_status())
}

fn main() -> ExitCode {
    let args = ConvergeCli::parse();
    perfgate::init_tracing(args.debug);

    match run(&args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::from_error(&err).into()
        }
    }
}
