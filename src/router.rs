//! Slot-aware dispatch orchestration.
//!
//! One `dispatch` call fans a multi-key batch out as one sub-request per
//! owning node, waits for all of them, and folds the replies back into one
//! per-key outcome map. Policies, in order:
//!
//! - unknown slot owners trigger at most one topology refresh per call;
//! - per-entry `Moved` replies are followed for at most one hop per call;
//! - per-key failures never abort the rest of the batch, so partial success
//!   is observable in the returned map.

use crate::batch::{group_by_node, DispatchGroup, Entry};
use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::slot::key_to_slot;
use crate::topology::{Discovery, NodeId, TopologyMap};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, warn};

/// Reply for one entry of a batched sub-request, positional with the
/// entries the router sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemReply {
    /// The node accepted the entry and produced this payload.
    Value(Bytes),
    /// The node no longer owns the entry's slot; it moved to `target`.
    Moved { target: NodeId },
}

/// External transport collaborator.
///
/// Sends one batched sub-request to one node and returns exactly one
/// `ItemReply` per entry, in entry order. Connection management, the wire
/// protocol and transport-level retries all live behind this trait. A
/// node-level failure (connect refused, broken pipe) is an `Err`, typically
/// `RouterError::NodeUnreachable`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, node: &NodeId, entries: &[Entry]) -> Result<Vec<ItemReply>>;
}

/// Final outcome for one input key.
pub type KeyOutcome = Result<Bytes>;

/// Aggregated result of one dispatch call: every input key maps to exactly
/// one outcome. No ordering is guaranteed beyond the key association.
pub type DispatchOutcome = HashMap<Bytes, KeyOutcome>;

/// Routes multi-key batches across the cluster.
pub struct ClusterRouter {
    topology: Arc<TopologyMap>,
    discovery: Arc<dyn Discovery>,
    transport: Arc<dyn Transport>,
    config: RouterConfig,
}

impl ClusterRouter {
    pub fn new(
        topology: Arc<TopologyMap>,
        discovery: Arc<dyn Discovery>,
        transport: Arc<dyn Transport>,
        config: RouterConfig,
    ) -> Self {
        Self {
            topology,
            discovery,
            transport,
            config,
        }
    }

    /// Shared topology handle, for embedders that refresh out of band.
    pub fn topology(&self) -> Arc<TopologyMap> {
        Arc::clone(&self.topology)
    }

    /// Dispatch a multi-key batch and aggregate per-key outcomes.
    ///
    /// Blocks (asynchronously) until every sub-request completed or the
    /// dispatch deadline expired. Results from sub-requests that completed
    /// in time always stand, even when others timed out or failed.
    pub async fn dispatch(&self, entries: Vec<Entry>) -> DispatchOutcome {
        let mut outcomes = DispatchOutcome::with_capacity(entries.len());
        if entries.is_empty() {
            return outcomes;
        }
        let deadline = Instant::now() + self.config.dispatch_timeout();

        // All grouping in this call works against one consistent snapshot,
        // regardless of concurrent refreshes.
        let snapshot = self.topology.snapshot();
        let mut grouped = group_by_node(&snapshot, entries);

        for entry in grouped.malformed.drain(..) {
            outcomes.insert(
                entry.key,
                Err(RouterError::MalformedKey("empty key".to_string())),
            );
        }

        if !grouped.needs_refresh.is_empty() {
            let pending = std::mem::take(&mut grouped.needs_refresh);
            debug!(
                entries = pending.len(),
                "unknown slot owners, refreshing topology"
            );
            match self.discovery.refresh_topology().await {
                Ok(table) => {
                    self.topology.replace(table);
                    let fresh = self.topology.snapshot();
                    let regrouped = group_by_node(&fresh, pending);
                    for entry in regrouped.needs_refresh {
                        let slot = key_to_slot(&entry.key);
                        warn!(slot, "slot owner still unknown after refresh");
                        outcomes.insert(entry.key, Err(RouterError::TopologyUnknown(slot)));
                    }
                    for entry in regrouped.malformed {
                        outcomes.insert(
                            entry.key,
                            Err(RouterError::MalformedKey("empty key".to_string())),
                        );
                    }
                    for (node, group) in regrouped.by_node {
                        grouped.by_node.entry(node).or_default().extend(group);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "topology refresh failed");
                    for entry in pending {
                        outcomes.insert(entry.key, Err(RouterError::Discovery(e.to_string())));
                    }
                }
            }
        }

        // First round: one sub-request per owning node, concurrently.
        debug!(groups = grouped.by_node.len(), "dispatching batch");
        let mut redirects: HashMap<NodeId, DispatchGroup> = HashMap::new();
        let first_round = std::mem::take(&mut grouped.by_node);
        self.run_round(first_round, deadline, &mut outcomes, Some(&mut redirects))
            .await;

        // Follow at most one redirect hop for the affected entries only.
        if !redirects.is_empty() {
            debug!(nodes = redirects.len(), "following one redirect hop");
            self.run_round(redirects, deadline, &mut outcomes, None).await;
        }

        outcomes
    }

    /// Run one fan-out round. When `redirects` is `Some`, `Moved` replies
    /// are collected there for another round; when `None`, the redirect
    /// budget is spent and `Moved` surfaces as `Redirected`.
    async fn run_round(
        &self,
        groups: HashMap<NodeId, DispatchGroup>,
        deadline: Instant,
        outcomes: &mut DispatchOutcome,
        mut redirects: Option<&mut HashMap<NodeId, DispatchGroup>>,
    ) {
        let mut tasks = JoinSet::new();
        for (node, group) in groups {
            let transport = Arc::clone(&self.transport);
            tasks.spawn(async move {
                let result = timeout_at(deadline, transport.send(&node, &group)).await;
                (node, group, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (node, group, result) = match joined {
                Ok(task_output) => task_output,
                Err(e) => {
                    // Only reachable when a transport implementation panics
                    error!("dispatch sub-task failed: {}", e);
                    continue;
                }
            };
            match result {
                Err(_elapsed) => {
                    warn!(
                        node = %node,
                        keys = group.len(),
                        "sub-request missed the dispatch deadline"
                    );
                    for entry in group {
                        outcomes
                            .insert(entry.key, Err(RouterError::Timeout { node: node.clone() }));
                    }
                }
                Ok(Err(e)) => {
                    warn!(node = %node, error = %e, "sub-request failed");
                    for entry in group {
                        outcomes.insert(entry.key, Err(e.clone()));
                    }
                }
                Ok(Ok(replies)) => {
                    if replies.len() != group.len() {
                        let err = RouterError::Protocol(format!(
                            "node {} answered {} replies for {} entries",
                            node,
                            replies.len(),
                            group.len()
                        ));
                        error!(node = %node, "{}", err);
                        for entry in group {
                            outcomes.insert(entry.key, Err(err.clone()));
                        }
                        continue;
                    }
                    for (entry, reply) in group.into_iter().zip(replies) {
                        match reply {
                            ItemReply::Value(value) => {
                                outcomes.insert(entry.key, Ok(value));
                            }
                            ItemReply::Moved { target } => {
                                if let Some(map) = redirects.as_deref_mut() {
                                    map.entry(target).or_default().push(entry);
                                } else {
                                    let slot = key_to_slot(&entry.key);
                                    warn!(
                                        slot,
                                        target = %target,
                                        "second redirect in one dispatch, surfacing to caller"
                                    );
                                    outcomes.insert(
                                        entry.key,
                                        Err(RouterError::Redirected { slot, target }),
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
