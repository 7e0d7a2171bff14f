//! `transformPatch`: rebasing a list of ops (`proposed`) so it composes
//! correctly once another list (`accepted`) has already been applied.
//!
//! Grounded directly on the fold-left-over-accepted-ops shape used by this
//! codebase's ancestor OT module: each accepted op rewrites the remaining
//! proposed ops one at a time via a dispatcher keyed on the accepted op's
//! kind (`x_add`, `x_remove`, `x_move`, ...), generalized here from RFC 6902
//! to this crate's custom opcode set (`increment`/`bit`/`min`/`max`/`@txt`).
//!
//! `transformPatch` never fails: an unresolvable rewrite degrades to either
//! dropping the op or passing it through unchanged, never an error.

use crate::patch::Op;
use crate::path;
use crate::registry::{OpClass, TypeRegistry};
use crate::text;

/// Fold `accepted` left to right; each accepted op rewrites the remaining
/// `proposed` ops before the next accepted op is considered.
pub fn transform_patch(accepted: &[Op], proposed: &[Op], registry: &TypeRegistry) -> Vec<Op> {
    let mut current = proposed.to_vec();
    for op in accepted {
        current = apply_xform(op, current, registry);
    }
    current
}

fn apply_xform(accepted: &Op, proposed: Vec<Op>, registry: &TypeRegistry) -> Vec<Op> {
    match accepted {
        Op::Add { path, .. } => x_add(path, proposed),
        Op::Remove { path } => x_remove(path, proposed),
        Op::Replace { path, .. } => x_replace(path, proposed),
        Op::Move { path, from } => x_move(from, path, proposed),
        Op::Copy { path, .. } => x_add(path, proposed),
        Op::Test { .. } => proposed,
        Op::Increment { .. } | Op::Bit { .. } | Op::Min { .. } | Op::Max { .. } => proposed,
        Op::Text { path, delta } => x_text(path, delta, proposed),
        Op::Custom(custom) => match registry.get(&custom.opcode).map(|h| h.like()) {
            Some(OpClass::Add) | Some(OpClass::Copy) => x_add(&custom.path, proposed),
            Some(OpClass::Remove) => x_remove(&custom.path, proposed),
            Some(OpClass::Replace) => x_replace(&custom.path, proposed),
            Some(OpClass::Move) => {
                let from = custom.from.clone().unwrap_or_default();
                x_move(&from, &custom.path, proposed)
            }
            Some(OpClass::Test) | None => proposed,
        },
    }
}

fn is_equal_or_descendant(ancestor: &[String], candidate: &[String]) -> bool {
    path::is_path_equal(ancestor, candidate) || path::is_child(ancestor, candidate)
}

fn array_prefix(path: &[String]) -> &[String] {
    &path[..path.len().saturating_sub(1)]
}

fn numeric_index(path: &[String]) -> Option<usize> {
    path.last().and_then(|token| {
        if token == "-" {
            None
        } else {
            patches_json_pointer::is_valid_index(token)
                .then(|| token.parse().ok())
                .flatten()
        }
    })
}

/// Rewrite the remaining ops after an `add`/`copy` at `add_path`: array
/// descendants at or past the insertion index shift up by one; ops rooted
/// exactly at or under `add_path` on an object are dropped (the add
/// overwrote/created that subtree, so a stale nested write no longer
/// applies).
fn x_add(add_path: &[String], ops: Vec<Op>) -> Vec<Op> {
    let array_path = array_prefix(add_path);
    let at_index = numeric_index(add_path);

    ops.into_iter()
        .filter_map(|op| {
            if let Some(idx) = at_index {
                if let Some(shifted) = path::bump_array_path(array_path, idx, op.path()) {
                    let mut rewritten = op.with_path(shifted);
                    if let Some(from) = rewritten.from_path() {
                        if let Some(shifted_from) = path::bump_array_path(array_path, idx, from) {
                            rewritten = rewritten.with_from(shifted_from);
                        }
                    }
                    return Some(rewritten);
                }
                if let Some(from) = op.from_path() {
                    if let Some(shifted_from) = path::bump_array_path(array_path, idx, from) {
                        return Some(op.with_from(shifted_from));
                    }
                }
            }
            if at_index.is_none() && is_equal_or_descendant(add_path, op.path()) {
                return None; // overwritten by the newly-created subtree
            }
            Some(op)
        })
        .collect()
}

/// Rewrite the remaining ops after a `remove` at `removed_path`: ops rooted
/// under it vanish, array descendants past the removed index shift down by
/// one, and a `move`/`copy` whose `from` pointed into the removed subtree
/// degrades to a `remove` at its own destination (there is nothing left to
/// move).
fn x_remove(removed_path: &[String], ops: Vec<Op>) -> Vec<Op> {
    let array_path = array_prefix(removed_path);
    let at_index = numeric_index(removed_path).unwrap_or(usize::MAX);

    ops.into_iter()
        .filter_map(|op| {
            if is_equal_or_descendant(removed_path, op.path()) {
                return None;
            }
            if let Some(from) = op.from_path() {
                if is_equal_or_descendant(removed_path, from) {
                    return Some(Op::Remove { path: op.path().to_vec() });
                }
            }
            let mut rewritten = op;
            if let Some(shifted) = path::lower_array_path(array_path, at_index, rewritten.path()) {
                rewritten = rewritten.with_path(shifted);
            }
            if let Some(from) = rewritten.from_path() {
                if let Some(shifted_from) = path::lower_array_path(array_path, at_index, from) {
                    rewritten = rewritten.with_from(shifted_from);
                }
            }
            Some(rewritten)
        })
        .collect()
}

/// Rewrite the remaining ops after a `replace` at `replaced_path`: ops
/// rooted under it are dropped (the prior value they assumed is gone).
fn x_replace(replaced_path: &[String], ops: Vec<Op>) -> Vec<Op> {
    ops.into_iter()
        .filter(|op| !is_equal_or_descendant(replaced_path, op.path()))
        .collect()
}

/// Rewrite the remaining ops after a `move` from `from` to `to`: composed
/// as a remove at `from` followed by an add at `to`, with the "moving
/// upward in the same array" correction — when both paths share an array
/// and the source index is below the destination, the destination index
/// used for bumping is one less than its nominal value, since the removal
/// already closed that gap before the insertion happens.
fn x_move(from: &[String], to: &[String], ops: Vec<Op>) -> Vec<Op> {
    let from_array = array_prefix(from);
    let to_array = array_prefix(to);
    let from_idx = numeric_index(from);
    let mut to_idx = numeric_index(to);

    if let (Some(f), Some(t)) = (from_idx, to_idx) {
        if from_array == to_array && f < t {
            to_idx = Some(t - 1);
        }
    }

    let after_remove = x_remove(from, ops);
    after_remove
        .into_iter()
        .filter_map(|op| {
            if let Some(idx) = to_idx {
                if let Some(shifted) = path::bump_array_path(to_array, idx, op.path()) {
                    return Some(op.with_path(shifted));
                }
            }
            Some(op)
        })
        .collect()
}

/// Rewrite the remaining ops after a `@txt` delta at `text_path`: any other
/// op at a strict sub-path is dropped (the text op owns the whole leaf); a
/// concurrent `@txt` on the exact same path is rebased via the delta
/// transform, with the accepted delta winning attribute tie-breaks.
fn x_text(text_path: &[String], accepted_delta: &[text::TextOp], ops: Vec<Op>) -> Vec<Op> {
    ops.into_iter()
        .filter_map(|op| {
            if path::is_child(text_path, op.path()) {
                return None;
            }
            if let Op::Text { path, delta } = &op {
                if path::is_path_equal(path, text_path) {
                    return Some(Op::Text {
                        path: path.clone(),
                        delta: text::transform(accepted_delta, delta, true),
                    });
                }
            }
            Some(op)
        })
        .collect()
}
