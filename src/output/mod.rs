//! Output module for the CLI
//!
//! Schema-versioned JSON responses and the human-readable labels shared with
//! the DOT export.

pub mod command;
pub mod labels;

pub use command::{
    generate_execution_id, output_json, render_json, DetailResponse, ErrorResponse, JsonResponse,
    MergeResponse, NoticeResponse, OutcomeResponse, OutputFormat, SnapshotResponse,
};
