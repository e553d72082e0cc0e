//! Import command implementation
//!
//! Loads a JSON transfer dataset, or a raw transaction log aggregated per
//! sender and recipient, into a SQLite database usable by `explore --db`.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use txscope::output::{generate_execution_id, output_json, JsonResponse};
use txscope::query::{
    aggregate_transactions, CollectOptions, CollectStats, SqliteExecutor, TransactionLog, TransferDataset,
};
use txscope::OutputFormat;

use crate::cli::ImportSource;

#[derive(Debug, Serialize)]
struct ImportResponse {
    db_path: String,
    addresses: usize,
    transfers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    collected: Option<CollectStats>,
}

fn load(source: &ImportSource) -> Result<(TransferDataset, Option<CollectStats>)> {
    match source {
        ImportSource::Dataset(path) => Ok((TransferDataset::from_json_file(path)?, None)),
        ImportSource::Transactions { path, keep_zero_value } => {
            let log = TransactionLog::from_json_file(path)?;
            let options = CollectOptions {
                skip_zero_value: !keep_zero_value,
            };
            let (dataset, stats) = aggregate_transactions(&log, options)?;
            info!(
                transactions = stats.transactions,
                duplicate = stats.skipped_duplicate,
                zero_value = stats.skipped_zero_value,
                contract_creation = stats.skipped_contract_creation,
                transfers = stats.transfers,
                "transactions aggregated"
            );
            Ok((dataset, Some(stats)))
        }
    }
}

pub fn run_import(source: ImportSource, db_path: PathBuf, output_format: OutputFormat) -> Result<()> {
    let (dataset, collected) = load(&source)?;
    let executor = SqliteExecutor::new(&db_path);
    executor.ensure_schema()?;
    let stats = executor.import_dataset(&dataset)?;
    info!(
        addresses = stats.addresses,
        transfers = stats.transfers,
        db = %db_path.display(),
        "import finished"
    );

    match output_format {
        OutputFormat::Human => {
            if let Some(collect) = &collected {
                println!(
                    "Aggregated {} transactions into {} transfers (skipped {} duplicate, {} zero-value, {} contract creation)",
                    collect.transactions,
                    collect.transfers,
                    collect.skipped_duplicate,
                    collect.skipped_zero_value,
                    collect.skipped_contract_creation
                );
            }
            println!(
                "Imported {} addresses and {} transfers into {}",
                stats.addresses,
                stats.transfers,
                db_path.display()
            );
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = ImportResponse {
                db_path: db_path.display().to_string(),
                addresses: stats.addresses,
                transfers: stats.transfers,
                collected,
            };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
    }
    Ok(())
}
