//! Explorer configuration

use serde::{Deserialize, Serialize};

use crate::graph::{DetailPolicy, EdgePolicy};
use crate::query::RecordLimit;

/// What the controller does with an action issued while a query is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Reject with `ExploreError::Busy`
    #[default]
    Serialize,
    /// Let it through; late results are filtered by generation
    Overlap,
}

/// Exploration session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Limit used by the seed query and by actions issued without one
    pub record_limit: RecordLimit,
    /// Storage of parallel edges
    pub edge_policy: EdgePolicy,
    /// Handling of repeated directions in detail rows
    pub detail_policy: DetailPolicy,
    pub dispatch_policy: DispatchPolicy,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            record_limit: RecordLimit::default(),
            edge_policy: EdgePolicy::AppendLog,
            detail_policy: DetailPolicy::Overwrite,
            dispatch_policy: DispatchPolicy::Serialize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = ExplorerConfig::default();
        assert_eq!(config.record_limit.get(), 1000);
        assert_eq!(config.edge_policy, EdgePolicy::AppendLog);
        assert_eq!(config.detail_policy, DetailPolicy::Overwrite);
        assert_eq!(config.dispatch_policy, DispatchPolicy::Serialize);
    }

    #[test]
    fn test_config_deserializes_snake_case() {
        let config: ExplorerConfig = serde_json::from_str(
            r#"{ "record_limit": 50, "edge_policy": "merge_by_pair",
                 "detail_policy": "sum", "dispatch_policy": "overlap" }"#,
        )
        .unwrap();
        assert_eq!(config.record_limit.get(), 50);
        assert_eq!(config.edge_policy, EdgePolicy::MergeByPair);
        assert_eq!(config.dispatch_policy, DispatchPolicy::Overlap);
    }
}
