//! Explore command implementation
//!
//! Reads one exploration command per stdin line, runs it against the session
//! controller and reports the outcome on stdout. Errors are reported and the
//! loop carries on; a failed query is acknowledged right after it is printed.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use txscope::graph::{export_snapshot, ExportConfig, ExportFormat};
use txscope::output::labels::{edge_label, kind_label};
use txscope::output::DetailResponse;
use txscope::query::{MemoryExecutor, QueryExecutor, RecordLimit, SqliteExecutor, TransferDataset};
use txscope::session::{Outcome, SessionController};
use txscope::{
    generate_execution_id, render_json, ErrorResponse, ExploreError, ExplorerConfig, JsonResponse,
    OutcomeResponse, OutputFormat, SnapshotResponse,
};

use crate::cli::DataSource;

/// One line of explore input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreCommand {
    Seed,
    All(Option<RecordLimit>),
    Search(String, Option<RecordLimit>),
    Expand(String, Option<RecordLimit>),
    Select(String),
    Clear,
    Ack,
    Show,
    Export(ExportFormat, Option<PathBuf>),
    Quit,
}

fn optional_limit(word: Option<&str>) -> Result<Option<RecordLimit>, String> {
    word.map(str::parse::<RecordLimit>).transpose()
}

impl ExploreCommand {
    /// Parse one input line; blank lines and `#` comments give Ok(None).
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        if verb.starts_with('#') {
            return Ok(None);
        }

        let command = match verb.to_lowercase().as_str() {
            "seed" => ExploreCommand::Seed,
            "all" => ExploreCommand::All(optional_limit(words.next())?),
            "search" | "expand" | "select" => {
                let address = words
                    .next()
                    .ok_or_else(|| format!("{} requires an address", verb))?
                    .to_string();
                match verb.to_lowercase().as_str() {
                    "search" => ExploreCommand::Search(address, optional_limit(words.next())?),
                    "expand" => ExploreCommand::Expand(address, optional_limit(words.next())?),
                    _ => ExploreCommand::Select(address),
                }
            }
            "clear" => ExploreCommand::Clear,
            "ack" => ExploreCommand::Ack,
            "show" => ExploreCommand::Show,
            "export" => {
                let format = words.next().ok_or("export requires a format")?;
                let format = ExportFormat::from_str(format)
                    .ok_or_else(|| format!("Unknown export format: {}", format))?;
                ExploreCommand::Export(format, words.next().map(PathBuf::from))
            }
            "quit" | "exit" => ExploreCommand::Quit,
            other => return Err(format!("Unknown command: {}", other)),
        };

        if let Some(extra) = words.next() {
            return Err(format!("Unexpected argument: {}", extra));
        }
        Ok(Some(command))
    }
}

fn open_executor(source: &DataSource) -> Result<Arc<dyn QueryExecutor>> {
    match source {
        DataSource::Json(path) => {
            let dataset = TransferDataset::from_json_file(path)?;
            Ok(Arc::new(MemoryExecutor::new(dataset)))
        }
        DataSource::Sqlite(path) => {
            if !path.exists() {
                anyhow::bail!("Database not found: {}", path.display());
            }
            Ok(Arc::new(SqliteExecutor::new(path)))
        }
    }
}

struct Reporter {
    format: OutputFormat,
    execution_id: String,
}

impl Reporter {
    fn json<T: serde::Serialize>(&self, data: T) -> Result<()> {
        let response = JsonResponse::new(data, &self.execution_id);
        println!("{}", render_json(&response, self.format)?);
        Ok(())
    }

    fn outcome(&self, outcome: &Outcome, controller: &SessionController<dyn QueryExecutor>) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.json(OutcomeResponse::from(outcome));
        }
        match outcome {
            Outcome::Merged(report) => {
                let graph = controller.graph();
                println!(
                    "{:?}: {} new addresses, {} transfers added ({} addresses, {} transfers in session)",
                    report.mode,
                    report.added_nodes.len(),
                    report.edges_appended,
                    graph.node_count(),
                    graph.edge_count()
                );
            }
            Outcome::Detail { address, detail } => {
                let response = DetailResponse::new(address, *detail);
                println!("{}", response.address);
                println!("  {}", response.kind_label);
                println!("  {}", response.explorer_url);
                for line in response.lines {
                    println!("  {}", line);
                }
            }
            Outcome::Notice(notice) => println!("{}", notice),
            Outcome::Stale => println!("Discarded a stale result"),
            Outcome::SelectionCleared => println!("Selection cleared"),
        }
        Ok(())
    }

    fn error(&self, err: &ExploreError) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.json(ErrorResponse::from(err));
        }
        eprintln!("Error [{}]: {}", err.code(), err);
        Ok(())
    }

    fn snapshot(&self, controller: &SessionController<dyn QueryExecutor>) -> Result<()> {
        let selected = controller.selection().map(|s| s.address.id.clone());
        if self.format != OutputFormat::Human {
            return self.json(SnapshotResponse::new(controller.snapshot(), selected));
        }
        let graph = controller.graph();
        println!("{} addresses, {} transfers", graph.node_count(), graph.edge_count());
        for node in graph.nodes() {
            let marker = if selected.as_deref() == Some(node.id.as_str()) { "*" } else { " " };
            println!("{} {}  {}", marker, node.id, kind_label(node.kind));
        }
        for edge in graph.edges() {
            println!("  {} -> {}  {}", edge.source, edge.target, edge_label(edge));
        }
        Ok(())
    }
}

fn export(
    controller: &SessionController<dyn QueryExecutor>,
    format: ExportFormat,
    path: Option<PathBuf>,
    reporter: &Reporter,
) -> Result<()> {
    let config = ExportConfig::new(format)
        .with_minify(reporter.format == OutputFormat::Json)
        .with_highlight(controller.selection().map(|s| s.address.id.clone()));
    let content = export_snapshot(&controller.snapshot(), &config)?;

    match path {
        Some(path) => {
            std::fs::write(&path, &content)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
            if reporter.format == OutputFormat::Human {
                println!("Exported {} bytes to {}", content.len(), path.display());
            } else {
                reporter.json(serde_json::json!({
                    "exported": path.display().to_string(),
                    "format": format.extension(),
                    "bytes": content.len(),
                }))?;
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

/// Run the explore loop until `quit` or end of input
pub fn run_explore(source: DataSource, config: ExplorerConfig, output_format: OutputFormat) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to start runtime: {}", e))?;

    let executor = open_executor(&source)?;
    let mut controller: SessionController<dyn QueryExecutor> = SessionController::new(executor, config);
    let reporter = Reporter {
        format: output_format,
        execution_id: generate_execution_id(),
    };
    let default_limit = config.record_limit;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match ExploreCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("Error: {}", message);
                continue;
            }
        };

        let result = match command {
            ExploreCommand::Quit => break,
            ExploreCommand::Show => {
                reporter.snapshot(&controller)?;
                continue;
            }
            ExploreCommand::Export(format, path) => {
                if let Err(e) = export(&controller, format, path, &reporter) {
                    eprintln!("Error: {}", e);
                }
                continue;
            }
            ExploreCommand::Ack => {
                if !controller.acknowledge() {
                    eprintln!("Nothing to acknowledge");
                }
                continue;
            }
            ExploreCommand::Clear => Ok(controller.clear_selection()),
            ExploreCommand::Seed => runtime.block_on(controller.load_seed()),
            ExploreCommand::All(limit) => {
                runtime.block_on(controller.load_all(limit.unwrap_or(default_limit)))
            }
            ExploreCommand::Search(address, limit) => runtime.block_on(
                controller.search_address(&address, limit.unwrap_or(default_limit)),
            ),
            ExploreCommand::Expand(address, limit) => {
                runtime.block_on(controller.expand(&address, limit.unwrap_or(default_limit)))
            }
            ExploreCommand::Select(address) => runtime.block_on(controller.select_node(&address)),
        };

        match result {
            Ok(outcome) => reporter.outcome(&outcome, &controller)?,
            Err(err) => {
                reporter.error(&err)?;
                controller.acknowledge();
            }
        }
    }

    Ok(())
}
