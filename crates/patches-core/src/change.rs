//! `Change` and `Snapshot`: the client-visible units the OT rebase loop
//! persists and exchanges with a server.

use crate::node::Node;
use crate::patch::Op;
use serde_json::Value;

/// A patch plus the revision bookkeeping needed to rebase it against
/// concurrent server changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub id: String,
    /// This change's own revision number.
    pub rev: u64,
    /// The committed revision it was authored against.
    pub base_rev: u64,
    pub ops: Vec<Op>,
    pub metadata: Value,
    /// Milliseconds since the Unix epoch.
    pub created: i64,
    /// Links split fragments of one logical edit (oversize batching).
    pub batch_id: Option<String>,
}

impl Change {
    /// Rough wire size in bytes, used to decide whether a change fits under
    /// a `RebaseConfig::max_payload_bytes` budget. Computed from the
    /// compact codec encoding, which is what actually crosses the wire.
    pub fn serialized_len(&self) -> usize {
        crate::codec::compact::encode(&self.ops).to_string().len()
    }
}

/// Authoritative state at committed `rev`, plus the ordered pending
/// (uncommitted) changes layered on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: Node,
    pub rev: u64,
    pub changes: Vec<Change>,
}
