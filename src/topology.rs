//! Slot-to-node topology.
//!
//! The slot table is immutable once published. Refreshes swap the whole
//! table behind one pointer, so a dispatch that captured a snapshot keeps
//! reading a consistent view even while discovery replaces the mapping.
//! Population is the discovery collaborator's job; this module only stores
//! and serves lookups.

use crate::error::{Result, RouterError};
use crate::slot::SLOT_COUNT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, RwLock};

/// Total slots as usize for vector indexing
const SLOT_COUNT_USIZE: usize = SLOT_COUNT as usize;

/// Opaque identifier of a cluster member.
///
/// Usually "host:port", but the router never interprets the contents; it
/// only hands the id back to the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One immutable slot-ownership table: slot index -> owning node.
///
/// `None` means the owner is unknown (startup, or a refresh that could not
/// cover every slot). Unknown is a recoverable state the router must resolve
/// via refresh, never a reason to pick a default node.
#[derive(Debug, Clone)]
pub struct SlotTable {
    assignments: Vec<Option<NodeId>>,
}

impl SlotTable {
    /// Create a table with every slot unknown.
    pub fn new() -> Self {
        Self {
            assignments: vec![None; SLOT_COUNT_USIZE],
        }
    }

    /// Assign an inclusive slot range to `node`.
    pub fn assign(&mut self, slots: RangeInclusive<u16>, node: NodeId) -> Result<()> {
        if *slots.end() >= SLOT_COUNT {
            return Err(RouterError::InvalidSlot(*slots.end()));
        }
        for slot in slots {
            self.assignments[slot as usize] = Some(node.clone());
        }
        Ok(())
    }

    /// Owner of `slot`, or `None` if unknown.
    pub fn node_for(&self, slot: u16) -> Option<&NodeId> {
        self.assignments.get(slot as usize).and_then(|n| n.as_ref())
    }

    /// Count the number of assigned slots.
    pub fn assigned_count(&self) -> usize {
        self.assignments.iter().filter(|s| s.is_some()).count()
    }

    /// Check if all slots are assigned.
    pub fn is_complete(&self) -> bool {
        self.assigned_count() == SLOT_COUNT_USIZE
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the current slot table.
///
/// Single writer (the discovery collaborator), many readers (every
/// dispatch). Readers clone out the current `Arc` and keep using it
/// unaffected by later `replace` calls; there is no in-place mutation.
#[derive(Debug)]
pub struct TopologyMap {
    table: RwLock<Arc<SlotTable>>,
}

impl TopologyMap {
    /// Create a topology with every slot unknown.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(SlotTable::new())),
        }
    }

    /// Create a topology from an initial table.
    pub fn with_table(table: SlotTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Capture the current table. The snapshot stays valid and consistent
    /// for as long as the caller holds it.
    pub fn snapshot(&self) -> Arc<SlotTable> {
        Arc::clone(&self.table.read().unwrap())
    }

    /// Atomically replace the whole table. Never patches incrementally, so
    /// readers cannot observe a mix of pre and post refresh entries.
    pub fn replace(&self, table: SlotTable) {
        *self.table.write().unwrap() = Arc::new(table);
    }
}

impl Default for TopologyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// External discovery collaborator.
///
/// Queries the cluster for current slot ownership and rebuilds the table.
/// The router calls this at most once per dispatch, and only when some key
/// resolved to an unknown slot.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn refresh_topology(&self) -> Result<SlotTable>;
}
