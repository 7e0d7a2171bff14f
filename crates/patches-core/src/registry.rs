//! The operation type registry (spec component B): maps an opcode to the
//! handler that knows how to apply/invert/transform/compose it, merging
//! built-in operators with user-supplied custom ones.
//!
//! The built-in opcodes (`+ - = > & ? ^ ~ @txt min max`) are handled directly
//! by the concrete [`crate::patch::Op`] variants and the free functions in
//! [`crate::ops`]/[`crate::transform`] — that mirrors how the algebra is
//! actually written in this codebase's ancestry, where the op set is a closed
//! enum rather than a table of trait objects. The registry's job is to let
//! *unknown* opcodes (carried as [`crate::patch::Op::Custom`]) participate in
//! the same algebra by declaring which of the built-in equivalence classes
//! they behave like.

use indexmap::IndexMap;
use serde_json::Value;
use std::rc::Rc;

/// The equivalence class a handler belongs to, used by generic path-rewriting
/// code to decide how a custom op should be bumped, dropped, or redirected
/// when an unrelated op is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

/// A registered handler for a custom opcode.
pub trait OpHandler {
    /// Which built-in equivalence class this opcode behaves like for the
    /// purposes of generic path rewriting during `transform`.
    fn like(&self) -> OpClass;

    /// Apply this op's value at `path` against `target`, returning the new
    /// value (or an error string suitable for [`crate::error::OpError::InvalidOpValue`]).
    fn apply(&self, target: Option<&Value>, value: &Value) -> Result<Value, String>;

    /// Compose two consecutive values for this opcode at the same path.
    /// Opcodes without a meaningful compose law return `None`, which tells
    /// `composePatch` to flush rather than collapse.
    fn compose(&self, _v1: &Value, _v2: &Value) -> Option<Value> {
        None
    }
}

/// Maps custom opcode strings to their handler. Built with
/// [`TypeRegistry::with_custom`] and then immutable for the lifetime of the
/// documents that use it (spec invariant: "registry instances are immutable
/// post-construction").
#[derive(Default, Clone)]
pub struct TypeRegistry {
    custom: IndexMap<String, Rc<dyn OpHandler>>,
}

impl TypeRegistry {
    /// A registry with only the built-in opcodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for [`TypeRegistry::new`], named to match callers that read more
    /// naturally as "start from the built-ins, then overlay custom handlers".
    pub fn with_builtins() -> Self {
        Self::new()
    }

    /// Overlay `custom` handlers on top of the built-ins. A custom opcode
    /// that names a built-in opcode is rejected by construction being a
    /// no-op: built-ins are never shadowed, matching the spec's "overlay"
    /// wording (the built-in map is never replaced, only extended).
    pub fn with_custom(custom: Vec<(String, Rc<dyn OpHandler>)>) -> Self {
        let mut map = IndexMap::new();
        for (opcode, handler) in custom {
            if !is_builtin_opcode(&opcode) {
                map.insert(opcode, handler);
            }
        }
        Self { custom: map }
    }

    pub fn get(&self, opcode: &str) -> Option<&Rc<dyn OpHandler>> {
        self.custom.get(opcode)
    }

    pub fn contains(&self, opcode: &str) -> bool {
        is_builtin_opcode(opcode) || self.custom.contains_key(opcode)
    }
}

pub fn is_builtin_opcode(opcode: &str) -> bool {
    matches!(
        opcode,
        "+" | "-" | "=" | ">" | "&" | "?" | "^" | "~" | "@txt" | "min" | "max"
    )
}
