//! Command definition and flag-to-config resolution

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sizer_core::PipelineConfig;
use sizer_ingest::SourceTool;
use sizer_payload::{CloudType, StoragePolicy};
use sizer_transform::{FilterField, PowerStateFilter, StrategyRegistry};
use std::path::PathBuf;

fn tool_arg() -> Arg {
    Arg::new("file-type")
        .short('t')
        .long("file-type")
        .value_parser(|s: &str| s.parse::<SourceTool>())
        .help("Tool that produced the inventory: rvtools or liveoptics")
}

fn files_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .num_args(1..)
        .action(ArgAction::Append)
        .value_parser(value_parser!(PathBuf))
        .help("Inventory workbook(s), read in order")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Pipeline configuration file (.yaml, .json or .toml)")
}

fn output_arg() -> Arg {
    Arg::new("output-dir")
        .short('o')
        .long("output-dir")
        .value_parser(value_parser!(PathBuf))
        .help("Directory for artifacts and the sizing request [default: output]")
}

fn list_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).num_args(1..).action(ArgAction::Append).help(help)
}

fn field_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_parser(|s: &str| s.parse::<FilterField>())
        .help(help)
}

/// Build the command tree
pub(crate) fn build_cli() -> Command {
    let strategies = StrategyRegistry::with_defaults().names().join(", ");

    Command::new("vm-sizer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Normalize VM inventories and build sizing requests")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("describe")
                .about("Summarize an inventory without writing anything")
                .arg(tool_arg())
                .arg(files_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the summary as JSON"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Ingest, filter, partition and assemble a sizing request")
                .arg(tool_arg())
                .arg(files_arg())
                .arg(config_arg())
                .arg(output_arg())
                .arg(
                    Arg::new("from-dataset")
                        .long("from-dataset")
                        .value_parser(value_parser!(PathBuf))
                        .conflicts_with("file")
                        .help("Start from a stored dataset artifact instead of workbooks"),
                )
                .arg(
                    Arg::new("power-state")
                        .short('p')
                        .long("power-state")
                        .value_parser(|s: &str| s.parse::<PowerStateFilter>())
                        .help("Power filter: a (all), p (on), ps (on or suspended)"),
                )
                .arg(field_arg("include-field", "Field for the include filter"))
                .arg(list_arg("include-values", "Substrings a record must contain to be kept"))
                .arg(field_arg("exclude-field", "Field for the exclude filter"))
                .arg(list_arg("exclude-values", "Substrings that drop a record"))
                .arg(
                    Arg::new("partition")
                        .short('w')
                        .long("partition")
                        .help(format!("Grouping strategy: {strategies}")),
                )
                .arg(list_arg("profile-list", "Clusters or substrings for the strategy"))
                .arg(
                    Arg::new("include-remainder")
                        .long("include-remainder")
                        .action(ArgAction::SetTrue)
                        .help("Collect unmatched VMs into a remainder profile"),
                )
                .arg(
                    Arg::new("storage-policy")
                        .long("storage-policy")
                        .value_parser(|s: &str| s.parse::<StoragePolicy>())
                        .help("Storage figure to size on: provisioned or utilized"),
                )
                .arg(
                    Arg::new("cloud-type")
                        .long("cloud-type")
                        .value_parser(|s: &str| s.parse::<CloudType>())
                        .help("Target cloud: VMC_ON_AWS or GCVE"),
                )
                .arg(
                    Arg::new("print-request")
                        .long("print-request")
                        .action(ArgAction::SetTrue)
                        .help("Print the sizing request JSON to stdout"),
                ),
        )
        .subcommand(
            Command::new("payload")
                .about("Rebuild the sizing request from a stored profile manifest")
                .arg(config_arg())
                .arg(output_arg())
                .arg(
                    Arg::new("print-request")
                        .long("print-request")
                        .action(ArgAction::SetTrue)
                        .help("Print the sizing request JSON to stdout"),
                ),
        )
}

fn one<T: Clone + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> Option<T> {
    args.try_get_one::<T>(id).ok().flatten().cloned()
}

fn many<T: Clone + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> Option<Vec<T>> {
    args.try_get_many::<T>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
}

fn flag(args: &ArgMatches, id: &str) -> bool {
    one::<bool>(args, id).unwrap_or(false)
}

/// Start from the config file, if any, then apply flags on top
///
/// Flags a subcommand does not define are skipped.
pub(crate) fn resolve_config(args: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match one::<PathBuf>(args, "config") {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(tool) = one::<SourceTool>(args, "file-type") {
        config.tool = tool;
    }
    if let Some(files) = many::<PathBuf>(args, "file") {
        config.inputs = files;
    }
    if let Some(dir) = one::<PathBuf>(args, "output-dir") {
        config.output_dir = dir;
    }
    if let Some(filter) = one::<PowerStateFilter>(args, "power-state") {
        config.power_state = filter;
    }
    if let Some(field) = one::<FilterField>(args, "include-field") {
        config.include_field = Some(field);
    }
    if let Some(values) = many::<String>(args, "include-values") {
        config.include_values = Some(values);
    }
    if let Some(field) = one::<FilterField>(args, "exclude-field") {
        config.exclude_field = Some(field);
    }
    if let Some(values) = many::<String>(args, "exclude-values") {
        config.exclude_values = Some(values);
    }
    if let Some(strategy) = one::<String>(args, "partition") {
        config.partition = Some(strategy);
    }
    if let Some(values) = many::<String>(args, "profile-list") {
        config.profile_list = Some(values);
    }
    if flag(args, "include-remainder") {
        config.include_remainder = true;
    }
    if let Some(policy) = one::<StoragePolicy>(args, "storage-policy") {
        config.storage_policy = policy;
    }
    if let Some(cloud) = one::<CloudType>(args, "cloud-type") {
        config.sizing.cloud_type = cloud;
    }
    Ok(config)
}
