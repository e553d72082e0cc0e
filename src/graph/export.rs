//! Snapshot export
//!
//! Writes a [`GraphSnapshot`] as JSON (the `nodes`/`links` shape force-graph
//! renderers load directly), JSON Lines, CSV or Graphviz DOT.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::output::labels::{edge_label, node_color};

use super::{AddressKind, GraphSnapshot};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `{ "nodes": [...], "links": [...] }`
    Json,
    /// JSON Lines format (one JSON record per line)
    JsonL,
    /// One CSV table, `record_type` column tells nodes from edges
    Csv,
    /// Graphviz DOT digraph
    Dot,
}

impl ExportFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "jsonl" => Some(ExportFormat::JsonL),
            "csv" => Some(ExportFormat::Csv),
            "dot" => Some(ExportFormat::Dot),
            _ => None,
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::JsonL => "jsonl",
            ExportFormat::Csv => "csv",
            ExportFormat::Dot => "dot",
        }
    }
}

/// Configuration for snapshot export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Use minified JSON (no pretty-printing)
    pub minify: bool,
    /// Address drawn as selected (DOT only)
    pub highlight: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            format: ExportFormat::Json,
            minify: false,
            highlight: None,
        }
    }
}

impl ExportConfig {
    /// Create a new export config with the specified format
    pub fn new(format: ExportFormat) -> Self {
        ExportConfig {
            format,
            ..Default::default()
        }
    }

    /// Set whether to minify JSON output
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Set the highlighted address
    pub fn with_highlight(mut self, address: Option<String>) -> Self {
        self.highlight = address;
        self
    }
}

/// Node entry for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: String,
    pub kind: AddressKind,
}

/// Edge entry for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkExport {
    pub source: String,
    pub target: String,
    pub count: u64,
    pub total_amount: f64,
}

/// JSON export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub links: Vec<LinkExport>,
}

/// JSONL record type discriminator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonlRecord {
    Node(NodeExport),
    Link(LinkExport),
}

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    record_type: &'static str,
    id: Option<&'a str>,
    kind: Option<&'static str>,
    source: Option<&'a str>,
    target: Option<&'a str>,
    count: Option<u64>,
    total_amount: Option<f64>,
}

fn to_export(snapshot: &GraphSnapshot) -> GraphExport {
    GraphExport {
        nodes: snapshot
            .nodes
            .iter()
            .map(|n| NodeExport {
                id: n.id.clone(),
                kind: n.kind,
            })
            .collect(),
        links: snapshot
            .edges
            .iter()
            .map(|e| LinkExport {
                source: e.source.clone(),
                target: e.target.clone(),
                count: e.count,
                total_amount: e.total_amount,
            })
            .collect(),
    }
}

/// Export a snapshot in the configured format
pub fn export_snapshot(snapshot: &GraphSnapshot, config: &ExportConfig) -> Result<String> {
    match config.format {
        ExportFormat::Json => export_json(snapshot, config.minify),
        ExportFormat::JsonL => export_jsonl(snapshot),
        ExportFormat::Csv => export_csv(snapshot),
        ExportFormat::Dot => Ok(export_dot(snapshot, config.highlight.as_deref())),
    }
}

fn export_json(snapshot: &GraphSnapshot, minify: bool) -> Result<String> {
    let export = to_export(snapshot);
    if minify {
        Ok(serde_json::to_string(&export)?)
    } else {
        Ok(serde_json::to_string_pretty(&export)?)
    }
}

/// One compact JSON object per line, nodes first, each tagged with "type"
fn export_jsonl(snapshot: &GraphSnapshot) -> Result<String> {
    let export = to_export(snapshot);
    let mut out = String::new();
    for record in export
        .nodes
        .into_iter()
        .map(JsonlRecord::Node)
        .chain(export.links.into_iter().map(JsonlRecord::Link))
    {
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

fn export_csv(snapshot: &GraphSnapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for node in &snapshot.nodes {
        writer.serialize(CsvRecord {
            record_type: "node",
            id: Some(&node.id),
            kind: Some(node.kind.as_str()),
            source: None,
            target: None,
            count: None,
            total_amount: None,
        })?;
    }
    for edge in &snapshot.edges {
        writer.serialize(CsvRecord {
            record_type: "edge",
            id: None,
            kind: None,
            source: Some(&edge.source),
            target: Some(&edge.target),
            count: Some(edge.count),
            total_amount: Some(edge.total_amount),
        })?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn export_dot(snapshot: &GraphSnapshot, highlight: Option<&str>) -> String {
    let mut out = String::from("digraph txscope {\n");
    out.push_str("  node [style=filled];\n");
    for node in &snapshot.nodes {
        let selected = highlight == Some(node.id.as_str());
        let _ = writeln!(
            out,
            "  \"{}\" [fillcolor=\"{}\"];",
            escape_dot(&node.id),
            node_color(node.kind, selected)
        );
    }
    for edge in &snapshot.edges {
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            escape_dot(&edge.source),
            escape_dot(&edge.target),
            escape_dot(&edge_label(edge))
        );
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Address, Edge};

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![
                Address::new("0xa", AddressKind::Abnormal),
                Address::new("0xb", AddressKind::Normal),
            ],
            edges: vec![Edge {
                source: "0xa".into(),
                target: "0xb".into(),
                count: 3,
                total_amount: 1.5,
            }],
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ExportFormat::from_str("JSONL"), Some(ExportFormat::JsonL));
        assert_eq!(ExportFormat::from_str("dot"), Some(ExportFormat::Dot));
        assert_eq!(ExportFormat::from_str("scip"), None);
    }

    #[test]
    fn test_json_uses_links_key() {
        let out = export_snapshot(&snapshot(), &ExportConfig::new(ExportFormat::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["nodes"][0]["id"], "0xa");
        assert_eq!(value["nodes"][0]["kind"], "abnormal");
        assert_eq!(value["links"][0]["count"], 3);
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let out = export_snapshot(&snapshot(), &ExportConfig::new(ExportFormat::JsonL)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"type\":\"node\""));
        assert!(lines[2].contains("\"type\":\"link\""));
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let out = export_snapshot(&snapshot(), &ExportConfig::new(ExportFormat::Csv)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "record_type,id,kind,source,target,count,total_amount");
        assert_eq!(lines[1], "node,0xa,abnormal,,,,");
        assert_eq!(lines[3], "edge,,,0xa,0xb,3,1.5");
    }

    #[test]
    fn test_dot_colors_and_labels() {
        let config = ExportConfig::new(ExportFormat::Dot).with_highlight(Some("0xb".into()));
        let out = export_snapshot(&snapshot(), &config).unwrap();
        assert!(out.starts_with("digraph txscope {"));
        assert!(out.contains("\"0xa\" [fillcolor=\"orange\"];"));
        assert!(out.contains("\"0xb\" [fillcolor=\"red\"];"));
        assert!(out.contains("\"0xa\" -> \"0xb\" [label=\"# TXs: 3, Amt: 1.5ETH\"];"));
    }
}
