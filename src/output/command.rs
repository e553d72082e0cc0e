//! JSON output types for the CLI
//!
//! Every response is wrapped in a [`JsonResponse`] carrying the schema version,
//! an execution id and a timestamp so that consumers reading a long explore
//! session from stdout can correlate lines.

use serde::{Deserialize, Serialize};

use crate::error::ExploreError;
use crate::graph::{Address, AddressDetail, AddressKind, Edge, GraphSnapshot, MergeMode, MergeReport};
use crate::session::{Notice, Outcome};

use super::labels::{detail_lines, explorer_url, kind_label};

/// Current JSON output schema version
pub const TXSCOPE_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper for all JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for parsing stability
    pub schema_version: String,
    /// Unique execution ID for this run
    pub execution_id: String,
    /// Tool name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// RFC 3339 timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Response data
    pub data: T,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: TXSCOPE_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            tool: Some("txscope".to_string()),
            timestamp: Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            data,
        }
    }
}

/// Current session contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<Address>,
    pub edges: Vec<Edge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl SnapshotResponse {
    pub fn new(snapshot: GraphSnapshot, selected: Option<String>) -> Self {
        Self {
            node_count: snapshot.nodes.len(),
            edge_count: snapshot.edges.len(),
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            selected,
        }
    }
}

/// Summary of one merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResponse {
    pub mode: MergeMode,
    pub added_nodes: Vec<String>,
    pub edges_appended: usize,
    pub edges_merged: usize,
    pub edges_skipped: usize,
}

impl From<&MergeReport> for MergeResponse {
    fn from(report: &MergeReport) -> Self {
        Self {
            mode: report.mode,
            added_nodes: report.added_nodes.iter().map(|n| n.id.clone()).collect(),
            edges_appended: report.edges_appended,
            edges_merged: report.edges_merged,
            edges_skipped: report.edges_skipped,
        }
    }
}

/// Detail panel of the selected address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub address: String,
    pub kind: AddressKind,
    pub kind_label: String,
    pub explorer_url: String,
    pub detail: AddressDetail,
    /// Human lines, zero directions omitted
    pub lines: Vec<String>,
}

impl DetailResponse {
    pub fn new(address: &Address, detail: AddressDetail) -> Self {
        Self {
            address: address.id.clone(),
            kind: address.kind,
            kind_label: kind_label(address.kind).to_string(),
            explorer_url: explorer_url(&address.id),
            detail,
            lines: detail_lines(&detail),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub code: String,
    #[serde(flatten)]
    pub notice: Notice,
    pub message: String,
}

impl From<&Notice> for NoticeResponse {
    fn from(notice: &Notice) -> Self {
        Self {
            code: notice.code().to_string(),
            notice: notice.clone(),
            message: notice.to_string(),
        }
    }
}

/// Response for errors in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code, `TXS-{CATEGORY}-{NNN}`
    pub code: String,
    /// Error category/type
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&ExploreError> for ErrorResponse {
    fn from(err: &ExploreError) -> Self {
        Self {
            code: err.code().to_string(),
            error: err.category().to_string(),
            message: err.to_string(),
        }
    }
}

/// An [`Outcome`] as written to stdout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeResponse {
    Merged(MergeResponse),
    Detail(DetailResponse),
    Notice(NoticeResponse),
    Stale,
    SelectionCleared,
}

impl From<&Outcome> for OutcomeResponse {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Merged(report) => OutcomeResponse::Merged(report.into()),
            Outcome::Detail { address, detail } => {
                OutcomeResponse::Detail(DetailResponse::new(address, *detail))
            }
            Outcome::Notice(notice) => OutcomeResponse::Notice(notice.into()),
            Outcome::Stale => OutcomeResponse::Stale,
            Outcome::SelectionCleared => OutcomeResponse::SelectionCleared,
        }
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Human,
    /// One compact JSON document per line
    Json,
    /// Pretty-printed JSON
    Pretty,
}

impl OutputFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(OutputFormat::Human),
            "json" => Some(OutputFormat::Json),
            "pretty" => Some(OutputFormat::Pretty),
            _ => None,
        }
    }
}

/// Generate a unique execution ID for this run
pub fn generate_execution_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serialize as the format asks; `Human` falls back to pretty JSON
pub fn render_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(data)?,
        OutputFormat::Human | OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
    })
}

/// Output JSON to stdout
pub fn output_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render_json(data, format)?);
    Ok(())
}
