//! Session controller
//!
//! Turns user actions into queries, drives the injected executor and applies
//! results to the [`GraphSession`]. The work is split in three steps so that
//! the session is never borrowed across an await:
//!
//! 1. [`SessionController::issue`] validates the action, tags it with a
//!    generation and enters `Loading`
//! 2. [`SessionController::fetch`] runs the query; it only holds the executor
//! 3. [`SessionController::apply`] checks the tag against the current
//!    generation, then normalizes and merges
//!
//! A pending query that will never be applied must be passed to
//! [`SessionController::abandon`] to free its in-flight slot.
//!
//! Replace actions bump the graph generation when issued. An expand is tagged
//! with the generation of the session contents it was issued against, so an
//! expand result arriving after a newer replace has landed is discarded.
//! Detail queries carry a separate selection generation.

mod outcome;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DispatchPolicy, ExplorerConfig};
use crate::error::{ExploreError, QueryExecutionError};
use crate::graph::{aggregate_rows, normalize_rows, Address, AddressDetail, GraphSession, GraphSnapshot};
use crate::query::{QueryExecutor, QueryKind, QueryParams, RawRow, RecordLimit};
use crate::validation::{normalize_address, AddressValidator, HexAddressValidator};

pub use outcome::{Notice, Outcome};

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    /// A query failed; cleared by [`SessionController::acknowledge`]
    Error,
}

/// A user action that issues a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Neighborhoods of abnormal addresses, with the configured limit
    LoadSeed,
    LoadAll { limit: RecordLimit },
    Search { address: String, limit: RecordLimit },
    Expand { node_id: String, limit: RecordLimit },
    Select { node_id: String },
}

/// Generation tag attached to an issued query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTag {
    Replace { generation: u64 },
    Expand { generation: u64, node_id: String },
    Detail { generation: u64, address: Address },
}

/// An issued query waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub kind: QueryKind,
    pub params: QueryParams,
    pub tag: QueryTag,
}

/// A fetched query waiting to be applied
#[derive(Debug)]
pub struct FetchedQuery {
    pub pending: PendingQuery,
    pub result: Result<Vec<RawRow>, QueryExecutionError>,
}

/// The selected address and, once fetched, its detail
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub address: Address,
    pub detail: Option<AddressDetail>,
}

/// Owns one exploration session
pub struct SessionController<E: QueryExecutor + ?Sized + 'static> {
    executor: Arc<E>,
    validator: Box<dyn AddressValidator>,
    config: ExplorerConfig,
    graph: GraphSession,
    selection: Option<Selection>,
    state: SessionState,
    /// Bumped by every issued replace
    graph_generation: u64,
    /// Generation of the replace that produced the current contents
    content_generation: u64,
    selection_generation: u64,
    in_flight: usize,
    last_error: Option<String>,
}

impl<E: QueryExecutor + ?Sized + 'static> SessionController<E> {
    pub fn new(executor: Arc<E>, config: ExplorerConfig) -> Self {
        Self {
            executor,
            validator: Box::new(HexAddressValidator),
            config,
            graph: GraphSession::new(config.edge_policy),
            selection: None,
            state: SessionState::Idle,
            graph_generation: 0,
            content_generation: 0,
            selection_generation: 0,
            in_flight: 0,
            last_error: None,
        }
    }

    /// Replace the address validator used by `search_address`
    pub fn with_validator(mut self, validator: Box<dyn AddressValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn graph(&self) -> &GraphSession {
        &self.graph
    }

    /// Owned copy of the session for the rendering layer
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Validate `action`, tag it and enter `Loading`.
    ///
    /// Nothing changes when an error is returned.
    pub fn issue(&mut self, action: Action) -> Result<PendingQuery, ExploreError> {
        if self.state == SessionState::Error {
            return Err(ExploreError::Unacknowledged(
                self.last_error.clone().unwrap_or_default(),
            ));
        }
        if self.in_flight > 0 && self.config.dispatch_policy == DispatchPolicy::Serialize {
            return Err(ExploreError::Busy {
                in_flight: self.in_flight,
            });
        }

        let pending = match action {
            Action::LoadSeed => self.replace_query(
                QueryKind::AbnormalSeed,
                QueryParams::limited(self.config.record_limit),
            )?,
            Action::LoadAll { limit } => {
                self.replace_query(QueryKind::AllAddresses, QueryParams::limited(limit))?
            }
            Action::Search { address, limit } => {
                let address = normalize_address(&self.validator.validate(&address)?);
                self.replace_query(
                    QueryKind::ByAddress,
                    QueryParams::for_address(address).with_limit(limit),
                )?
            }
            Action::Expand { node_id, limit } => {
                let node_id = self.known_address(&node_id)?.id;
                let params = QueryParams::for_address(node_id.clone()).with_limit(limit);
                params.check(QueryKind::NodeNeighborhood)?;
                PendingQuery {
                    kind: QueryKind::NodeNeighborhood,
                    params,
                    tag: QueryTag::Expand {
                        generation: self.content_generation,
                        node_id,
                    },
                }
            }
            Action::Select { node_id } => {
                let address = self.known_address(&node_id)?;
                let params = QueryParams::for_address(address.id.clone());
                params.check(QueryKind::NodeDetail)?;
                self.selection_generation += 1;
                self.selection = Some(Selection {
                    address: address.clone(),
                    detail: None,
                });
                PendingQuery {
                    kind: QueryKind::NodeDetail,
                    params,
                    tag: QueryTag::Detail {
                        generation: self.selection_generation,
                        address,
                    },
                }
            }
        };

        self.in_flight += 1;
        self.state = SessionState::Loading;
        debug!(kind = %pending.kind, params = ?pending.params, in_flight = self.in_flight, "dispatching query");
        Ok(pending)
    }

    fn replace_query(&mut self, kind: QueryKind, params: QueryParams) -> Result<PendingQuery, ExploreError> {
        params.check(kind)?;
        self.graph_generation += 1;
        Ok(PendingQuery {
            kind,
            params,
            tag: QueryTag::Replace {
                generation: self.graph_generation,
            },
        })
    }

    fn known_address(&self, node_id: &str) -> Result<Address, ExploreError> {
        let id = normalize_address(node_id);
        self.graph
            .get(&id)
            .cloned()
            .ok_or(ExploreError::UnknownAddress(id))
    }

    /// Run an issued query. The returned future does not borrow the
    /// controller.
    pub fn fetch(&self, pending: PendingQuery) -> impl Future<Output = FetchedQuery> + Send + 'static {
        let executor = Arc::clone(&self.executor);
        async move {
            let result = executor.run(pending.kind, &pending.params).await;
            FetchedQuery { pending, result }
        }
    }

    fn is_current(&self, tag: &QueryTag) -> bool {
        match tag {
            QueryTag::Replace { generation } => *generation == self.graph_generation,
            QueryTag::Expand { generation, .. } => *generation == self.content_generation,
            QueryTag::Detail { generation, .. } => *generation == self.selection_generation,
        }
    }

    /// Apply a fetched result.
    ///
    /// Stale results are dropped, failed ones included. A failure on a current
    /// query moves the controller to `Error` and leaves the session as it was.
    pub fn apply(&mut self, fetched: FetchedQuery) -> Result<Outcome, ExploreError> {
        let FetchedQuery { pending, result } = fetched;
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.is_current(&pending.tag) {
            warn!(kind = %pending.kind, failed = result.is_err(), "discarding stale result");
            self.settle();
            return Ok(Outcome::Stale);
        }

        let outcome = result
            .map_err(ExploreError::from)
            .and_then(|rows| self.merge(pending, rows));
        if let Err(err) = &outcome {
            warn!(code = err.code(), error = %err, "query failed");
            self.state = SessionState::Error;
            self.last_error = Some(err.to_string());
        }
        self.settle();
        outcome
    }

    fn merge(&mut self, pending: PendingQuery, rows: Vec<RawRow>) -> Result<Outcome, ExploreError> {
        match pending.tag {
            QueryTag::Detail { address, .. } => {
                let detail = aggregate_rows(&rows, self.config.detail_policy)?;
                if let Some(selection) = self.selection.as_mut() {
                    selection.detail = Some(detail);
                }
                debug!(address = %address.id, rows = rows.len(), "selection detail updated");
                Ok(Outcome::Detail { address, detail })
            }
            _ if rows.is_empty() => {
                info!(kind = %pending.kind, "query returned no rows");
                Ok(Outcome::Notice(Notice::EmptyResult { kind: pending.kind }))
            }
            QueryTag::Replace { generation } => {
                let batch = normalize_rows(&rows)?;
                let report = self.graph.replace(batch);
                self.content_generation = generation;
                info!(
                    kind = %pending.kind,
                    nodes = self.graph.node_count(),
                    edges = self.graph.edge_count(),
                    "session replaced"
                );
                Ok(Outcome::Merged(report))
            }
            QueryTag::Expand { node_id, .. } => {
                let batch = normalize_rows(&rows)?;
                let report = self.graph.expand_from_node(batch);
                if report.is_noop() {
                    info!(node = %node_id, "expand found no new connections");
                    return Ok(Outcome::Notice(Notice::NoNewConnections { node_id }));
                }
                info!(
                    node = %node_id,
                    added = report.added_nodes.len(),
                    appended = report.edges_appended,
                    merged = report.edges_merged,
                    skipped = report.edges_skipped,
                    "session expanded"
                );
                Ok(Outcome::Merged(report))
            }
        }
    }

    /// Give up on an issued query whose result will never be applied.
    ///
    /// Frees its in-flight slot so a `Serialize` controller accepts the next
    /// action. Generations bumped when it was issued stay bumped.
    pub fn abandon(&mut self, pending: PendingQuery) {
        debug!(kind = %pending.kind, "query abandoned");
        self.release_slot();
    }

    fn release_slot(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.settle();
    }

    fn settle(&mut self) {
        if self.state != SessionState::Error {
            self.state = if self.in_flight > 0 {
                SessionState::Loading
            } else {
                SessionState::Idle
            };
        }
    }

    /// Leave the `Error` state. Returns false when there was nothing to
    /// acknowledge.
    pub fn acknowledge(&mut self) -> bool {
        if self.state != SessionState::Error {
            return false;
        }
        self.last_error = None;
        self.state = SessionState::Idle;
        self.settle();
        true
    }

    /// Issue, fetch and apply in one call.
    ///
    /// Dropping the returned future before it completes abandons the query.
    pub async fn run(&mut self, action: Action) -> Result<Outcome, ExploreError> {
        let pending = self.issue(action)?;
        let fetch = self.fetch(pending);
        let mut slot = InFlightSlot {
            controller: self,
            armed: true,
        };
        let fetched = fetch.await;
        slot.armed = false;
        slot.controller.apply(fetched)
    }

    pub async fn load_seed(&mut self) -> Result<Outcome, ExploreError> {
        self.run(Action::LoadSeed).await
    }

    pub async fn load_all(&mut self, limit: RecordLimit) -> Result<Outcome, ExploreError> {
        self.run(Action::LoadAll { limit }).await
    }

    pub async fn search_address(&mut self, address: &str, limit: RecordLimit) -> Result<Outcome, ExploreError> {
        self.run(Action::Search {
            address: address.to_string(),
            limit,
        })
        .await
    }

    pub async fn expand(&mut self, node_id: &str, limit: RecordLimit) -> Result<Outcome, ExploreError> {
        self.run(Action::Expand {
            node_id: node_id.to_string(),
            limit,
        })
        .await
    }

    pub async fn select_node(&mut self, node_id: &str) -> Result<Outcome, ExploreError> {
        self.run(Action::Select {
            node_id: node_id.to_string(),
        })
        .await
    }

    /// Drop the selection; a detail query still in flight becomes stale
    pub fn clear_selection(&mut self) -> Outcome {
        self.selection_generation += 1;
        self.selection = None;
        debug!("selection cleared");
        Outcome::SelectionCleared
    }
}

/// Releases the in-flight slot of a `run` dropped while fetching
struct InFlightSlot<'a, E: QueryExecutor + ?Sized + 'static> {
    controller: &'a mut SessionController<E>,
    armed: bool,
}

impl<E: QueryExecutor + ?Sized + 'static> Drop for InFlightSlot<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            debug!("query dropped before its result arrived");
            self.controller.release_slot();
        }
    }
}
