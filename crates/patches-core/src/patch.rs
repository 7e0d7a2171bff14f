//! The patch algebra: the `Op` type and `applyPatch` / `invertPatch` /
//! `composePatch`. `transformPatch` lives in [`crate::transform`].

use crate::error::{OpError, PatchApplyError};
use crate::node::Node;
use crate::ops;
use crate::registry::TypeRegistry;
use serde_json::Value;

/// A custom (non-built-in) op, dispatched through the [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct CustomOp {
    pub opcode: String,
    pub path: Vec<String>,
    pub value: Option<Value>,
    pub from: Option<Vec<String>>,
    pub soft: bool,
}

/// A single mutation primitive. Covers every built-in opcode from the wire
/// table (`+ - = > & ? ^ ~ @txt min max`) plus [`Op::Custom`] for anything
/// registered in a [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add { path: Vec<String>, value: Value, soft: bool },
    Remove { path: Vec<String> },
    Replace { path: Vec<String>, value: Value },
    Move { path: Vec<String>, from: Vec<String> },
    Copy { path: Vec<String>, from: Vec<String> },
    Test { path: Vec<String>, value: Value },
    Increment { path: Vec<String>, delta: f64 },
    Bit { path: Vec<String>, mask: u32 },
    Min { path: Vec<String>, value: Value },
    Max { path: Vec<String>, value: Value },
    Text { path: Vec<String>, delta: Vec<crate::text::TextOp> },
    Custom(CustomOp),
}

impl Op {
    pub fn path(&self) -> &[String] {
        match self {
            Op::Add { path, .. }
            | Op::Remove { path }
            | Op::Replace { path, .. }
            | Op::Move { path, .. }
            | Op::Copy { path, .. }
            | Op::Test { path, .. }
            | Op::Increment { path, .. }
            | Op::Bit { path, .. }
            | Op::Min { path, .. }
            | Op::Max { path, .. }
            | Op::Text { path, .. } => path,
            Op::Custom(c) => &c.path,
        }
    }

    pub fn from_path(&self) -> Option<&[String]> {
        match self {
            Op::Move { from, .. } | Op::Copy { from, .. } => Some(from),
            Op::Custom(c) => c.from.as_deref(),
            _ => None,
        }
    }

    /// Opcode string as it appears on the wire.
    pub fn opcode(&self) -> &str {
        match self {
            Op::Add { .. } => "+",
            Op::Remove { .. } => "-",
            Op::Replace { .. } => "=",
            Op::Move { .. } => ">",
            Op::Copy { .. } => "&",
            Op::Test { .. } => "?",
            Op::Increment { .. } => "^",
            Op::Bit { .. } => "~",
            Op::Min { .. } => "min",
            Op::Max { .. } => "max",
            Op::Text { .. } => "@txt",
            Op::Custom(c) => &c.opcode,
        }
    }

    /// Rebuild this op with a new path, keeping every other field.
    pub fn with_path(&self, new_path: Vec<String>) -> Op {
        match self {
            Op::Add { value, soft, .. } => Op::Add { path: new_path, value: value.clone(), soft: *soft },
            Op::Remove { .. } => Op::Remove { path: new_path },
            Op::Replace { value, .. } => Op::Replace { path: new_path, value: value.clone() },
            Op::Move { from, .. } => Op::Move { path: new_path, from: from.clone() },
            Op::Copy { from, .. } => Op::Copy { path: new_path, from: from.clone() },
            Op::Test { value, .. } => Op::Test { path: new_path, value: value.clone() },
            Op::Increment { delta, .. } => Op::Increment { path: new_path, delta: *delta },
            Op::Bit { mask, .. } => Op::Bit { path: new_path, mask: *mask },
            Op::Min { value, .. } => Op::Min { path: new_path, value: value.clone() },
            Op::Max { value, .. } => Op::Max { path: new_path, value: value.clone() },
            Op::Text { delta, .. } => Op::Text { path: new_path, delta: delta.clone() },
            Op::Custom(c) => Op::Custom(CustomOp { path: new_path, ..c.clone() }),
        }
    }

    /// Rebuild this op with a new `from`, for `move`/`copy`/custom-move ops.
    pub fn with_from(&self, new_from: Vec<String>) -> Op {
        match self {
            Op::Move { path, .. } => Op::Move { path: path.clone(), from: new_from },
            Op::Copy { path, .. } => Op::Copy { path: path.clone(), from: new_from },
            Op::Custom(c) => Op::Custom(CustomOp { from: Some(new_from), ..c.clone() }),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Strict mode aborts the whole patch on the first failing op.
    /// Lenient mode (used for transform-derived patches) skips it and
    /// continues.
    pub strict: bool,
}

/// Apply `ops` to `root` in a fresh session, returning the new root.
/// Structurally shares every subtree not on a mutation path.
pub fn apply_patch(
    root: &Node,
    ops: &[Op],
    options: ApplyOptions,
    registry: &TypeRegistry,
) -> Result<Node, PatchApplyError> {
    let mut state = root.clone();
    for (index, op) in ops.iter().enumerate() {
        match ops::apply(&mut state, op, registry) {
            Ok(()) => {}
            Err(source) => {
                if options.strict {
                    return Err(PatchApplyError { index, source });
                }
                // lenient: skip this op, keep going
            }
        }
    }
    Ok(state)
}

/// Produce the patch that undoes `ops`, evaluated against the pre-apply
/// state `root`. Always either succeeds completely or fails with a
/// `PatchMismatch`-flavored error — it never partially inverts.
pub fn invert_patch(
    root: &Node,
    ops: &[Op],
    registry: &TypeRegistry,
) -> Result<Vec<Op>, crate::error::InvertError> {
    let mut state = root.clone();
    let mut inverses = Vec::with_capacity(ops.len());
    for (index, op) in ops.iter().enumerate() {
        let inverse =
            ops::invert(&state, op, registry).map_err(|e| crate::error::InvertError {
                index,
                reason: e.to_string(),
            })?;
        ops::apply(&mut state, op, registry).map_err(|e| crate::error::InvertError {
            index,
            reason: e.to_string(),
        })?;
        inverses.push(inverse);
    }
    Ok(inverses.into_iter().rev().flatten().collect())
}

/// Collapse adjacent same-path, same-opcode ops via their compose law. Any
/// op at a parent path invalidates the cached "still composable" entries
/// nested under it — ops already emitted stay in the output, they simply
/// become ineligible to merge with anything later at that path.
pub fn compose_patch(ops: &[Op], registry: &TypeRegistry) -> Vec<Op> {
    let mut result: Vec<Op> = Vec::new();
    // Maps a path to the index in `result` of the last op at that exact
    // path that is still eligible to compose with a following same-path op.
    let mut composable: std::collections::HashMap<Vec<String>, usize> = std::collections::HashMap::new();

    for op in ops {
        let path = op.path().to_vec();

        // A write at or above `path` invalidates any deeper cached entry —
        // it may have restructured what that entry was composing against.
        composable.retain(|cached_path, _| !cached_path.starts_with(&path[..]));

        if let Some(&idx) = composable.get(&path) {
            if result[idx].opcode() == op.opcode() {
                if let Some(composed) = ops::compose(&result[idx], op, registry) {
                    result[idx] = composed;
                    continue;
                }
            }
        }

        result.push(op.clone());
        composable.insert(path, result.len() - 1);
    }
    result
}
