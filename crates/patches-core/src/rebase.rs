//! The OT rebase loop (spec component E): local edits become pending
//! `Change`s; committed server changes are integrated by transforming
//! pending ops against them and recomputing committed state.
//!
//! Grounded on the teacher's store/subscriber seam (`less_db_compat.rs`
//! sitting beside a trait-only model API) — the loop itself is new code,
//! since RFC 6902 tooling in the teacher has no concept of a rebase queue,
//! but its shape (synchronous methods, a store trait consumed at explicit
//! suspension points, a tiny in-memory reference store for tests) follows
//! that same pattern.

use crate::change::{Change, Snapshot};
use crate::error::RebaseError;
use crate::node::Node;
use crate::patch::{apply_patch, ApplyOptions, Op};
use crate::path;
use crate::registry::TypeRegistry;
use crate::text::{InsertContent, TextOp};
use crate::transform::transform_patch;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// Tunables for the local-edit half of the loop. `max_payload_bytes` turns
/// on oversize batching (spec §4.E, §8 scenario 6); `None` never splits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RebaseConfig {
    pub max_payload_bytes: Option<usize>,
}

/// Persistence/transport seam. The rebase loop never touches a network or
/// disk directly — a `ChangeStore` implementation does, at these five
/// methods, which are exactly the loop's suspension points (spec §5).
pub trait ChangeStore {
    fn get_doc(&self, id: &str) -> Result<Option<Snapshot>, RebaseError>;
    fn get_pending_changes(&self, id: &str) -> Result<Vec<Change>, RebaseError>;
    fn save_pending_changes(&self, id: &str, changes: &[Change]) -> Result<(), RebaseError>;
    fn apply_server_changes(
        &self,
        id: &str,
        server: &[Change],
        new_pending: &[Change],
    ) -> Result<(), RebaseError>;
    fn get_committed_rev(&self, id: &str) -> Result<u64, RebaseError>;
}

/// Notified whenever a document's materialized state changes, for UI
/// layers to re-render from. Out of this crate's scope to implement beyond
/// the trait itself (spec leaves transport/subscription external).
pub trait DocObserver {
    fn on_change(&mut self, state: &Value);
}

/// Allocate the next `Change` (or batch of changes, if oversize) for a
/// local edit. `ops` is the draft's diff; `committed_rev`/`pending` give
/// the revision bookkeeping needed to allocate `rev`/`baseRev`.
pub fn make_local_change(
    ops: Vec<Op>,
    committed_rev: u64,
    pending: &[Change],
    metadata: Value,
    created: i64,
    config: &RebaseConfig,
    mut next_id: impl FnMut() -> String,
) -> Result<Vec<Change>, RebaseError> {
    let last_pending_rev = pending.iter().map(|c| c.rev).max().unwrap_or(0);
    let base_rev = committed_rev;
    let first_rev = committed_rev.max(last_pending_rev) + 1;

    let Some(budget) = config.max_payload_bytes else {
        let change = Change {
            id: next_id(),
            rev: first_rev,
            base_rev,
            ops,
            metadata,
            created,
            batch_id: None,
        };
        return Ok(vec![change]);
    };

    let fragments = pack_into_budget(ops, budget)?;
    let batch_id = if fragments.len() > 1 {
        tracing::debug!(fragments = fragments.len(), budget, "splitting oversize local change into a batch");
        Some(next_id())
    } else {
        None
    };
    Ok(fragments
        .into_iter()
        .enumerate()
        .map(|(i, frag_ops)| Change {
            id: next_id(),
            rev: first_rev + i as u64,
            base_rev,
            ops: frag_ops,
            metadata: metadata.clone(),
            created,
            batch_id: batch_id.clone(),
        })
        .collect())
}

/// Greedily pack `ops` into the fewest change-sized fragments that each
/// serialize within `budget` bytes, splitting an individual oversize op
/// where that is safe (currently: `@txt` inserts of plain text).
fn pack_into_budget(ops: Vec<Op>, budget: usize) -> Result<Vec<Vec<Op>>, RebaseError> {
    let mut fragments: Vec<Vec<Op>> = Vec::new();
    let mut current: Vec<Op> = Vec::new();

    for op in ops {
        for piece in split_if_oversize(op, budget)? {
            let mut candidate = current.clone();
            candidate.push(piece.clone());
            if current.is_empty() || encoded_len(&candidate) <= budget {
                current = candidate;
            } else {
                fragments.push(std::mem::take(&mut current));
                current.push(piece);
                if encoded_len(&current) > budget {
                    tracing::warn!(budget, "op exceeds size budget even alone, cannot split further");
                    return Err(RebaseError::BudgetExceeded);
                }
            }
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    Ok(fragments)
}

fn encoded_len(ops: &[Op]) -> usize {
    crate::codec::compact::encode(ops).to_string().len()
}

/// If `op` alone would blow the budget, split it into smaller ops covering
/// the same net effect. Only `@txt` inserts of plain text are splittable;
/// anything else that doesn't fit is rejected.
fn split_if_oversize(op: Op, budget: usize) -> Result<Vec<Op>, RebaseError> {
    if encoded_len(std::slice::from_ref(&op)) <= budget {
        return Ok(vec![op]);
    }
    if let Op::Text { path, delta } = &op {
        if let Some(split) = split_text_delta(path, delta, budget) {
            tracing::debug!(pieces = split.len(), budget, "split oversize @txt insert into budgeted chunks");
            return Ok(split);
        }
    }
    tracing::warn!(budget, "op exceeds size budget and is not splittable");
    Err(RebaseError::BudgetExceeded)
}

/// Split a `@txt` delta whose single oversize piece is a retain-then-insert
/// of plain text into consecutive ops, each inserting a prefix chunk at the
/// advancing offset, so every fragment fits under `budget` on its own.
fn split_text_delta(path: &[String], delta: &[TextOp], budget: usize) -> Option<Vec<Op>> {
    let (retain_before, text, attrs) = match delta {
        [TextOp::Retain(n, _), TextOp::Insert(InsertContent::Text(s), attrs)] => (*n, s, attrs),
        [TextOp::Insert(InsertContent::Text(s), attrs)] => (0, s, attrs),
        _ => return None,
    };

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }
    // Binary-search-free heuristic: shrink the chunk size until the
    // resulting op fits, then reuse that size for every subsequent chunk.
    let mut chunk_chars = chars.len();
    loop {
        if chunk_chars == 0 {
            return None;
        }
        let probe: String = chars[..chunk_chars].iter().collect();
        let probe_op = Op::Text {
            path: path.to_vec(),
            delta: vec![TextOp::Retain(retain_before, None), TextOp::Insert(InsertContent::Text(probe), attrs.clone())],
        };
        if encoded_len(std::slice::from_ref(&probe_op)) <= budget {
            break;
        }
        chunk_chars -= (chunk_chars / 4).max(1);
    }

    let mut result = Vec::new();
    let mut offset = 0usize;
    let mut retain = retain_before;
    while offset < chars.len() {
        let end = (offset + chunk_chars).min(chars.len());
        let piece: String = chars[offset..end].iter().collect();
        result.push(Op::Text {
            path: path.to_vec(),
            delta: vec![TextOp::Retain(retain, None), TextOp::Insert(InsertContent::Text(piece.clone()), attrs.clone())],
        });
        retain += piece.chars().count();
        offset = end;
    }
    Some(result)
}

/// The result of integrating a batch of committed server changes.
pub struct Integration {
    pub new_committed_rev: u64,
    pub new_state: Node,
    pub rebased_pending: Vec<Change>,
}

/// Steps 1-6 of the spec's server-change integration algorithm. `snapshot`
/// is the pre-pending committed state (step 4's `stateBeforePending`);
/// `pending` is the client's current pending list; `server_changes` arrive
/// with contiguous `rev`s starting at `snapshot.rev + 1`.
///
/// Each pending change is transformed against the concatenated server ops
/// independently, which keeps its ops within its own change rather than a
/// single flattened list that would need re-partitioning after the fact.
///
/// A pending change with `base_rev == 0` was authored against the document's
/// very first revision, before it had any history of its own to have merged
/// a soft write against. After the normal transform, such a change gets one
/// extra fast-forward pass: any soft add whose path the post-integration
/// state already populates is dropped, since normal transform can only drop
/// a soft add by seeing a concurrent add in `server_ops`, not by seeing
/// state that predates this change's own base revision.
pub fn integrate_server_changes(
    snapshot: &Snapshot,
    pending: &[Change],
    server_changes: &[Change],
    registry: &TypeRegistry,
) -> Result<Integration, RebaseError> {
    let server_ops: Vec<Op> = server_changes.iter().flat_map(|c| c.ops.clone()).collect();

    let new_state = apply_patch(&snapshot.state, &server_ops, ApplyOptions { strict: false }, registry)
        .map_err(RebaseError::Apply)?;

    let new_committed_rev = server_changes
        .iter()
        .map(|c| c.rev)
        .max()
        .unwrap_or(snapshot.rev);

    let rebased_pending = pending
        .iter()
        .enumerate()
        .map(|(i, change)| {
            let transformed = transform_patch(&server_ops, &change.ops, registry);
            // A change authored against the very first revision (`baseRev ==
            // 0`) has no history of its own to have merged a soft write
            // against yet. Normal transform only drops a soft add when it
            // sees a concurrent add at the same path in `server_ops`; it
            // can't see a path the state already had before this change's
            // own base revision. Fast-forward that one extra filter here:
            // drop a soft add whose path the post-integration state already
            // populates.
            let ops = if change.base_rev == 0 {
                transformed
                    .into_iter()
                    .filter(|op| match op {
                        Op::Add { path: p, soft: true, .. } => path::get(&new_state, p).is_none(),
                        _ => true,
                    })
                    .collect()
            } else {
                transformed
            };
            Change {
                id: change.id.clone(),
                rev: new_committed_rev + i as u64 + 1,
                base_rev: new_committed_rev,
                ops,
                metadata: change.metadata.clone(),
                created: change.created,
                batch_id: change.batch_id.clone(),
            }
        })
        .collect();

    Ok(Integration { new_committed_rev, new_state, rebased_pending })
}

/// Drop pending changes the server has echoed back as committed. A server
/// change acknowledges a pending one when their `id`s match — there is no
/// separate "confirmed" bookkeeping.
pub fn acknowledge(pending: Vec<Change>, server_changes: &[Change]) -> Vec<Change> {
    pending
        .into_iter()
        .filter(|p| !server_changes.iter().any(|s| s.id == p.id))
        .collect()
}

struct MemoryDoc {
    state: Node,
    rev: u64,
    pending: Vec<Change>,
}

/// A trivial in-process `ChangeStore`, useful for tests and for a first
/// integration before a real persistence layer is wired up. Not meant for
/// production use — it holds everything in memory and is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<String, MemoryDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, id: &str, state: Node) {
        self.docs.borrow_mut().insert(
            id.to_string(),
            MemoryDoc { state, rev: 0, pending: Vec::new() },
        );
    }
}

impl ChangeStore for MemoryStore {
    fn get_doc(&self, id: &str) -> Result<Option<Snapshot>, RebaseError> {
        Ok(self.docs.borrow().get(id).map(|doc| Snapshot {
            state: doc.state.clone(),
            rev: doc.rev,
            changes: doc.pending.clone(),
        }))
    }

    fn get_pending_changes(&self, id: &str) -> Result<Vec<Change>, RebaseError> {
        self.docs.borrow().get(id).map(|doc| doc.pending.clone()).ok_or_else(|| {
            tracing::warn!(doc = id, "get_pending_changes: unknown document");
            RebaseError::DocNotFound(id.to_string())
        })
    }

    fn save_pending_changes(&self, id: &str, changes: &[Change]) -> Result<(), RebaseError> {
        let mut docs = self.docs.borrow_mut();
        let doc = docs.get_mut(id).ok_or_else(|| {
            tracing::warn!(doc = id, "save_pending_changes: unknown document, leaving state unchanged");
            RebaseError::DocNotFound(id.to_string())
        })?;
        doc.pending.extend_from_slice(changes);
        Ok(())
    }

    fn apply_server_changes(
        &self,
        id: &str,
        _server: &[Change],
        new_pending: &[Change],
    ) -> Result<(), RebaseError> {
        let mut docs = self.docs.borrow_mut();
        let doc = docs.get_mut(id).ok_or_else(|| {
            tracing::warn!(doc = id, "apply_server_changes: unknown document, leaving state unchanged");
            RebaseError::DocNotFound(id.to_string())
        })?;
        doc.pending = new_pending.to_vec();
        Ok(())
    }

    fn get_committed_rev(&self, id: &str) -> Result<u64, RebaseError> {
        self.docs.borrow().get(id).map(|doc| doc.rev).ok_or_else(|| {
            tracing::warn!(doc = id, "get_committed_rev: unknown document");
            RebaseError::DocNotFound(id.to_string())
        })
    }
}
