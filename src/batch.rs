//! Per-node grouping of multi-key batches.
//!
//! Switching nodes mid-batch costs a network round trip per switch, so a
//! multi-key call is partitioned into one group per owning node and each
//! group travels as a single sub-request. Relative entry order is preserved
//! within every group because the downstream protocol is positional
//! (alternating key/value arguments, one reply per entry).

use crate::slot::key_to_slot;
use crate::topology::{NodeId, SlotTable};
use bytes::Bytes;
use std::collections::HashMap;

/// One key/value pair of a multi-key call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Bytes,
    pub value: Bytes,
}

impl Entry {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered entries bound for one node in one sub-request.
pub type DispatchGroup = Vec<Entry>;

/// Result of partitioning a batch against one slot-table snapshot.
///
/// Entries whose slot has no known owner land in `needs_refresh`, never in
/// some default node's group; entries that cannot be hashed at all land in
/// `malformed`. Both buckets keep the original relative order.
#[derive(Debug, Default)]
pub struct GroupedBatch {
    pub by_node: HashMap<NodeId, DispatchGroup>,
    pub needs_refresh: Vec<Entry>,
    pub malformed: Vec<Entry>,
}

impl GroupedBatch {
    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty() && self.needs_refresh.is_empty() && self.malformed.is_empty()
    }
}

/// Partition `entries` by owning node according to `table`.
pub fn group_by_node(
    table: &SlotTable,
    entries: impl IntoIterator<Item = Entry>,
) -> GroupedBatch {
    let mut grouped = GroupedBatch::default();
    for entry in entries {
        if entry.key.is_empty() {
            grouped.malformed.push(entry);
            continue;
        }
        let slot = key_to_slot(&entry.key);
        match table.node_for(slot) {
            Some(node) => grouped
                .by_node
                .entry(node.clone())
                .or_default()
                .push(entry),
            None => grouped.needs_refresh.push(entry),
        }
    }
    grouped
}
