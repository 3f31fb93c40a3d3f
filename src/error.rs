use crate::topology::NodeId;
use thiserror::Error;

/// Routing layer errors.
///
/// Every variant maps to a per-key outcome: a failed sub-request never aborts
/// the surrounding dispatch, it only fails the keys it carried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Slot has no known owner, even after one topology refresh attempt.
    /// Recoverable: retry after the discovery collaborator catches up.
    #[error("no known owner for slot {0}")]
    TopologyUnknown(u16),

    /// Transport could not reach the resolved node.
    #[error("node {node} unreachable: {reason}")]
    NodeUnreachable { node: NodeId, reason: String },

    /// The owning node reported the slot moved and the single automatic
    /// redirect hop was already spent for this dispatch.
    #[error("slot {slot} moved to {target}")]
    Redirected { slot: u16, target: NodeId },

    /// Key cannot be routed (e.g. empty key bytes).
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The sub-request to this node did not complete before the dispatch
    /// deadline. Results from nodes that did complete stand.
    #[error("dispatch deadline exceeded waiting on {node}")]
    Timeout { node: NodeId },

    /// Topology refresh failed.
    #[error("topology discovery failed: {0}")]
    Discovery(String),

    /// Transport returned a reply that violates its positional contract.
    #[error("transport protocol violation: {0}")]
    Protocol(String),

    /// Slot index outside `[0, 16384)` while assembling a slot table.
    #[error("invalid slot {0} (out of range 0-16383)")]
    InvalidSlot(u16),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for slotroute operations
pub type Result<T> = std::result::Result<T, RouterError>;
