//! txscope: interactive exploration of cryptocurrency transfer graphs
//!
//! A session starts from a seed (the neighborhoods of addresses flagged as
//! abnormal), a full load, or a single address, and grows by expanding nodes.
//! Queries go to an injected [`QueryExecutor`]; raw rows come back and are
//! normalized into canonical addresses and transfer edges before they touch
//! the session graph.
//!
//! # Layers
//!
//! - [`query`]: query kinds, parameters, raw rows and the two bundled
//!   executors ([`MemoryExecutor`], [`SqliteExecutor`])
//! - [`graph`]: canonicalization, row normalization, detail aggregation, the
//!   session graph with its replace/expand merges, and export
//! - [`session`]: the controller that tags queries with generations, discards
//!   stale results and tracks the selection
//! - [`output`]: schema-versioned JSON responses and human labels
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use txscope::{ExplorerConfig, MemoryExecutor, SessionController, TransferDataset};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let dataset = TransferDataset::from_json_file(std::path::Path::new("transfers.json"))?;
//! let mut session = SessionController::new(
//!     Arc::new(MemoryExecutor::new(dataset)),
//!     ExplorerConfig::default(),
//! );
//! session.load_seed().await?;
//! println!("{} addresses", session.graph().node_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod error_codes;
pub mod graph;
pub mod output;
pub mod query;
pub mod session;
pub mod validation;

pub use config::{DispatchPolicy, ExplorerConfig};
pub use error::{ExploreError, InvalidRecordError, QueryExecutionError};
pub use graph::{
    Address, AddressDetail, AddressKind, DetailPolicy, Edge, EdgePolicy, ExportConfig, ExportFormat,
    GraphSession, GraphSnapshot, MergeMode, MergeReport,
};
pub use output::{
    generate_execution_id, render_json, ErrorResponse, JsonResponse, OutcomeResponse, OutputFormat,
    SnapshotResponse,
};
pub use query::{
    MemoryExecutor, QueryExecutor, QueryKind, QueryParams, RawRow, RecordLimit, SqliteExecutor,
    TransferDataset,
};
pub use session::{Action, Notice, Outcome, SessionController, SessionState};
pub use validation::{validate_address, AddressValidator, HexAddressValidator};
