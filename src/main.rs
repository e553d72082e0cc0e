//! txscope CLI - Interactive transaction graph explorer
//!
//! Usage: txscope <command> [arguments]

mod cli;
mod explore_cmd;
mod import_cmd;
mod version;

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{parse_args, print_usage, Command};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    match parse_args() {
        Ok(None) => ExitCode::SUCCESS,
        Ok(Some(Command::Explore {
            source,
            config,
            output_format,
        })) => {
            if let Err(e) = explore_cmd::run_explore(source, config, output_format) {
                eprintln!("Error: {}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Ok(Some(Command::Import {
            source,
            db_path,
            output_format,
        })) => {
            if let Err(e) = import_cmd::run_import(source, db_path, output_format) {
                eprintln!("Error: {}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            ExitCode::from(1)
        }
    }
}
