use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use fixmine_core::{init_tracing, Compression, MinerConfig, RecordReader, Rule};
use tracing::info;

fn cli() -> Command {
    Command::new("fixmine")
        .version(fixmine_core::VERSION)
        .about("Mine recurring bug-fix idioms from AST edit scripts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("mine")
                .about("Classify every diff of a dataset and write the record log and summary tables")
                .arg(
                    Arg::new("dataset")
                        .value_name("DATASET")
                        .help("Directory holding one subdirectory per project")
                        .index(1),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("DIR")
                        .help("Output directory for the record log and tables"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("FILE")
                        .help("JSON configuration file; flags override its values"),
                )
                .arg(
                    Arg::new("compress")
                        .long("compress")
                        .help("Compress the record log with zstd")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-specialize")
                        .long("no-specialize")
                        .help("Only emit base records")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("suffix")
                        .long("suffix")
                        .value_name("SUFFIX")
                        .help("File-name suffix of diff documents"),
                ),
        )
        .subcommand(
            Command::new("dump")
                .about("Print every record of a record log")
                .arg(
                    Arg::new("log")
                        .value_name("LOG")
                        .help("Record log written by `mine`")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("compressed")
                        .long("compressed")
                        .help("The log is zstd-compressed (implied by a .zst extension)")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("rules").about("List every rule identifier with its tier"))
}

/// Build the run configuration: defaults, then the config file, then flags
fn mine_config(matches: &ArgMatches) -> Result<MinerConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MinerConfig::from_json_file(path).with_context(|| format!("loading config {path}"))?,
        None => MinerConfig::default(),
    };

    if let Some(dataset) = matches.get_one::<String>("dataset") {
        config.dataset_root = PathBuf::from(dataset);
    }
    if let Some(out) = matches.get_one::<String>("out") {
        config.output_dir = PathBuf::from(out);
    }
    if let Some(suffix) = matches.get_one::<String>("suffix") {
        config.diff_suffix = suffix.clone();
    }
    if matches.get_flag("compress") && !config.compression.is_compressed() {
        config.compression = Compression::zstd();
    }
    if matches.get_flag("no-specialize") {
        config.specialize = false;
    }
    Ok(config)
}

fn run_mine(matches: &ArgMatches) -> Result<()> {
    let config = mine_config(matches)?;
    info!(
        dataset = %config.dataset_root.display(),
        out = %config.output_dir.display(),
        "starting run"
    );

    let crawler = config.crawler()?;
    let summary = config.miner()?.run(&crawler)?;

    println!("Projects:    {}", summary.projects);
    println!("Files:       {}", summary.files);
    println!("Edits:       {}", summary.stats.edits);
    println!("Unmatched:   {}", summary.stats.unmatched);
    println!("Records:     {}", summary.stats.records);
    println!("Specialized: {}", summary.stats.specialized);
    println!("Record log:  {}", config.record_log_path().display());
    Ok(())
}

fn run_dump(matches: &ArgMatches) -> Result<()> {
    let Some(log) = matches.get_one::<String>("log") else {
        anyhow::bail!("missing record log path");
    };
    let compression = if matches.get_flag("compressed") || log.ends_with(".zst") {
        Compression::zstd()
    } else {
        Compression::None
    };

    for record in RecordReader::open(log, compression)? {
        let record = record.with_context(|| format!("reading {log}"))?;
        println!("{}\t{}", record.project, record.rule);
    }
    Ok(())
}

fn run_rules() {
    for (id, tier) in Rule::CATALOG {
        println!("{id}\t{tier:?}");
    }
}

fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("mine", sub)) => run_mine(sub),
        Some(("dump", sub)) => run_dump(sub),
        Some(("rules", _)) => {
            run_rules();
            Ok(())
        }
        _ => anyhow::bail!("no command given"),
    }
}
