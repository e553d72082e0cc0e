//! CLI argument parsing for txscope
//!
//! Defines the Command enum and parse_args() for the `explore` and `import`
//! commands.

use anyhow::Result;
use std::path::PathBuf;
use txscope::config::{DispatchPolicy, ExplorerConfig};
use txscope::graph::{DetailPolicy, EdgePolicy};
use txscope::query::RecordLimit;
use txscope::OutputFormat;

pub fn print_usage() {
    eprintln!("txscope - Interactive transaction graph explorer");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  txscope <command> [arguments]");
    eprintln!("  txscope --help");
    eprintln!("  txscope --version");
    eprintln!();
    eprintln!("  txscope explore (--data <JSON> | --db <FILE>) [--limit <N>] [--merge-edges] [--sum-details] [--overlap] [--output <FORMAT>]");
    eprintln!("  txscope import (--data <JSON> | --transactions <JSON> [--keep-zero-value]) --db <FILE> [--output <FORMAT>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  explore   Read exploration commands from stdin and report each result");
    eprintln!("  import    Load a JSON transfer dataset or raw transaction log into a SQLite database");
    eprintln!();
    eprintln!("Global arguments:");
    eprintln!("  --output <FORMAT>   Output format: human (default), json (compact), or pretty (formatted)");
    eprintln!();
    eprintln!("Explore arguments:");
    eprintln!("  --data <JSON>       Transfer dataset to query in memory");
    eprintln!("  --db <FILE>         SQLite transfer database (see import)");
    eprintln!("  --limit <N>         Record limit for seed and unbounded commands (default: 1000)");
    eprintln!("  --merge-edges       Sum parallel edges between the same pair instead of appending");
    eprintln!("  --sum-details       Sum repeated directions in detail rows instead of overwriting");
    eprintln!("  --overlap           Do not reject actions issued while a query is in flight");
    eprintln!();
    eprintln!("Import arguments:");
    eprintln!("  --data <JSON>           Aggregated transfer dataset");
    eprintln!("  --transactions <JSON>   Per-block transactions, summed per sender and recipient");
    eprintln!("  --keep-zero-value       Count zero-value transactions instead of skipping them");
    eprintln!("  --db <FILE>             SQLite database to create or append to");
    eprintln!();
    eprintln!("Explore commands (one per line on stdin):");
    eprintln!("  seed                Load neighborhoods of abnormal addresses");
    eprintln!("  all [N]             Load neighborhoods of all addresses");
    eprintln!("  search <ADDR> [N]   Replace the session with one address' neighborhood");
    eprintln!("  expand <ADDR> [N]   Merge the neighborhood of a node in the session");
    eprintln!("  select <ADDR>       Show transfer totals of a node in the session");
    eprintln!("  clear               Clear the selection");
    eprintln!("  ack                 Acknowledge a failed query");
    eprintln!("  show                Print the session");
    eprintln!("  export <FORMAT> [PATH]  Export the session as json, jsonl, csv or dot");
    eprintln!("  quit                Stop reading commands");
    eprintln!();
    eprintln!("Logging:");
    eprintln!("  RUST_LOG=<FILTER>   tracing filter for stderr diagnostics (default: warn)");
}

/// Where explore reads transfers from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Json(PathBuf),
    Sqlite(PathBuf),
}

/// What import reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Dataset(PathBuf),
    Transactions { path: PathBuf, keep_zero_value: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Explore {
        source: DataSource,
        config: ExplorerConfig,
        output_format: OutputFormat,
    },
    Import {
        source: ImportSource,
        db_path: PathBuf,
        output_format: OutputFormat,
    },
}

fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires an argument", args[i]))
}

fn parse_output_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(value).ok_or_else(|| anyhow::anyhow!("Invalid output format: {}", value))
}

/// Parse arguments (program name first).
///
/// Returns Ok(None) when `--version` or `--help` was handled.
pub fn parse_args_from<F>(args: &[String], print_version: F) -> Result<Option<Command>>
where
    F: FnOnce(),
{
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    let command = &args[1];

    if command == "--version" || command == "-V" {
        print_version();
        return Ok(None);
    }

    if command == "--help" || command == "-h" {
        print_usage();
        return Ok(None);
    }

    match command.as_str() {
        "explore" => {
            let mut data_path: Option<PathBuf> = None;
            let mut db_path: Option<PathBuf> = None;
            let mut config = ExplorerConfig::default();
            let mut output_format = OutputFormat::Human;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--data" => {
                        data_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--db" => {
                        db_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--limit" => {
                        config.record_limit = flag_value(args, i)?
                            .parse::<RecordLimit>()
                            .map_err(|e| anyhow::anyhow!("--limit: {}", e))?;
                        i += 2;
                    }
                    "--merge-edges" => {
                        config.edge_policy = EdgePolicy::MergeByPair;
                        i += 1;
                    }
                    "--sum-details" => {
                        config.detail_policy = DetailPolicy::Sum;
                        i += 1;
                    }
                    "--overlap" => {
                        config.dispatch_policy = DispatchPolicy::Overlap;
                        i += 1;
                    }
                    "--output" => {
                        output_format = parse_output_format(flag_value(args, i)?)?;
                        i += 2;
                    }
                    other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
                }
            }

            let source = match (data_path, db_path) {
                (Some(data), None) => DataSource::Json(data),
                (None, Some(db)) => DataSource::Sqlite(db),
                (Some(_), Some(_)) => {
                    return Err(anyhow::anyhow!("--data and --db are mutually exclusive"))
                }
                (None, None) => return Err(anyhow::anyhow!("Either --data or --db is required")),
            };

            Ok(Some(Command::Explore {
                source,
                config,
                output_format,
            }))
        }
        "import" => {
            let mut data_path: Option<PathBuf> = None;
            let mut transactions_path: Option<PathBuf> = None;
            let mut keep_zero_value = false;
            let mut db_path: Option<PathBuf> = None;
            let mut output_format = OutputFormat::Human;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--data" => {
                        data_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--transactions" => {
                        transactions_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--keep-zero-value" => {
                        keep_zero_value = true;
                        i += 1;
                    }
                    "--db" => {
                        db_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--output" => {
                        output_format = parse_output_format(flag_value(args, i)?)?;
                        i += 2;
                    }
                    other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
                }
            }

            let source = match (data_path, transactions_path) {
                (Some(data), None) if !keep_zero_value => ImportSource::Dataset(data),
                (Some(_), None) => {
                    return Err(anyhow::anyhow!("--keep-zero-value requires --transactions"))
                }
                (None, Some(path)) => ImportSource::Transactions { path, keep_zero_value },
                (Some(_), Some(_)) => {
                    return Err(anyhow::anyhow!("--data and --transactions are mutually exclusive"))
                }
                (None, None) => {
                    return Err(anyhow::anyhow!("Either --data or --transactions is required"))
                }
            };

            Ok(Some(Command::Import {
                source,
                db_path: db_path.ok_or_else(|| anyhow::anyhow!("--db is required"))?,
                output_format,
            }))
        }
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}

pub fn parse_args() -> Result<Option<Command>> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args, || {
        println!("{}", crate::version::version());
    })
}
