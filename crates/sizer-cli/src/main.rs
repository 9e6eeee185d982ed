//! `vm-sizer` command-line entry point

mod cli;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use sizer_core::{Pipeline, RunOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn report(outcome: &RunOutcome, print_request: bool) -> Result<()> {
    for stage in &outcome.stages {
        println!("  [{}] {}: {} VMs", stage.stage, stage.artifact, stage.records);
    }
    for warning in &outcome.warnings {
        println!("  warning: {warning}");
    }
    if let Some(path) = &outcome.request_path {
        println!("Sizing request written to {}", path.display());
    }
    if print_request {
        if let Some(request) = &outcome.request {
            println!("{}", request.to_json_pretty()?);
        }
    }
    Ok(())
}

fn describe(args: &ArgMatches) -> Result<()> {
    let config = cli::resolve_config(args)?;
    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.describe()?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn run(args: &ArgMatches) -> Result<()> {
    let config = cli::resolve_config(args)?;
    let pipeline = Pipeline::new(config)?;
    let outcome = match args.get_one::<PathBuf>("from-dataset") {
        Some(path) => pipeline
            .run_from_dataset(path)
            .with_context(|| format!("resuming from {}", path.display()))?,
        None => pipeline.run()?,
    };
    report(&outcome, args.get_flag("print-request"))
}

fn payload(args: &ArgMatches) -> Result<()> {
    let config = cli::resolve_config(args)?;
    let pipeline = Pipeline::new(config)?;
    let outcome = pipeline
        .payload_from_manifest()
        .with_context(|| format!("rebuilding request in {}", pipeline.store().root().display()))?;
    report(&outcome, args.get_flag("print-request"))
}

fn dispatch(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("describe", args)) => describe(args),
        Some(("run", args)) => run(args),
        Some(("payload", args)) => payload(args),
        Some((name, _)) => bail!("unknown command '{name}'"),
        None => bail!("no command given"),
    }
}

fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match dispatch(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
