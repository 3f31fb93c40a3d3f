//! Slot-aware batch routing for Redis Cluster style key-value stores.
//!
//! A cluster partitions its keyspace into 16384 hash slots and spreads slot
//! ownership across nodes. Multi-key calls that ignore ownership pay one
//! round trip per key; this crate computes each key's slot, groups keys by
//! owning node, and issues one batched sub-request per node, aggregating
//! per-key outcomes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               ClusterRouter                 │
//! │   (group, fan out, follow one redirect)     │
//! └─────────────────────────────────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │  slot + batch    │      │   TopologyMap    │
//! │ (CRC16, tags,    │      │ (slot -> node,   │
//! │  per-node groups)│      │  atomic swap)    │
//! └──────────────────┘      └──────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │    Transport     │      │    Discovery     │
//! │ (external, per-  │      │ (external, slot  │
//! │  node batches)   │      │  table rebuild)  │
//! └──────────────────┘      └──────────────────┘
//! ```
//!
//! Connection pooling, the wire protocol, topology discovery and retry
//! policy all live behind the [`router::Transport`] and
//! [`topology::Discovery`] traits; the embedding client supplies them.

pub mod batch;
pub mod config;
pub mod error;
pub mod router;
pub mod slot;
pub mod topology;

pub use batch::{group_by_node, DispatchGroup, Entry, GroupedBatch};
pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use router::{ClusterRouter, DispatchOutcome, ItemReply, KeyOutcome, Transport};
pub use slot::{crc16, hash_input, key_to_slot, SLOT_COUNT};
pub use topology::{Discovery, NodeId, SlotTable, TopologyMap};
