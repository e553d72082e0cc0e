//! What an applied action produced

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error_codes::{TXS_N_001_EMPTY_RESULT, TXS_N_002_NO_NEW_CONNECTIONS};
use crate::graph::{Address, AddressDetail, MergeReport};
use crate::query::QueryKind;

/// Informational, non-error result of an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// The query succeeded with zero rows; the session is unchanged
    EmptyResult { kind: QueryKind },
    /// An expand returned rows but every address was already present
    NoNewConnections { node_id: String },
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Notice::EmptyResult { .. } => TXS_N_001_EMPTY_RESULT,
            Notice::NoNewConnections { .. } => TXS_N_002_NO_NEW_CONNECTIONS,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyResult { .. } => write!(f, "No results found"),
            Notice::NoNewConnections { node_id } => {
                write!(f, "No new connections found for {}", node_id)
            }
        }
    }
}

/// Result of applying one fetched query
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The batch was merged into the session
    Merged(MergeReport),
    /// Detail of the selected address
    Detail {
        address: Address,
        detail: AddressDetail,
    },
    Notice(Notice),
    /// The result belonged to a superseded generation and was discarded
    Stale,
    SelectionCleared,
}

impl Outcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Outcome::Stale)
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Outcome::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}
