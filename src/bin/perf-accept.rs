use anyhow::{Context, Result};
use clap::Parser;
use perfgate::cli::AcceptCli;
use perfgate::error::ExitStatus;
use perfgate::{gate, report};
use std::process::ExitCode;

fn run(args: &AcceptCli) -> Result<ExitStatus> {
    let config = args.gate_config().context("Failed to load configuration")?;

    let outcome = gate::run_acceptance(&args.reference, &args.checked, &config.regression)
        .with_context(|| {
            format!(
                "Acceptance check of {} against {} failed",
                args.checked.display(),
                args.reference.display()
            )
        })?;

    print!("{}", report::render_regression(&outcome, args.format)?);
    Ok(outcome.exit_status())
}

fn main() -> ExitCode {
    let args = AcceptCli::parse();
    perfgate::init_tracing(args.debug);

    match run(&args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::from_error(&err).into()
        }
    }
}
