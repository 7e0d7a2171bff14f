//! patches-core — Operational Transformation over a JSON Patch dialect.
//!
//! Covers the patch algebra (`apply`/`invert`/compose`/`transform`), the
//! operation type registry for custom opcodes, the built-in operators
//! (including the `@txt` rich-text delta type), the compact and verbose
//! wire codecs, a structural diff for turning local edits into patches,
//! and the client-side rebase loop that keeps pending local changes
//! consistent with an authoritative server history.

pub mod change;
pub mod codec;
pub mod diff;
pub mod error;
pub mod node;
pub mod ops;
pub mod patch;
pub mod path;
pub mod rebase;
pub mod registry;
pub mod text;
pub mod transform;

pub use change::{Change, Snapshot};
pub use diff::diff;
pub use error::{CodecError, InvertError, OpError, PatchApplyError, RebaseError};
pub use node::Node;
pub use patch::{apply_patch, compose_patch, invert_patch, ApplyOptions, CustomOp, Op};
pub use rebase::{
    acknowledge, integrate_server_changes, make_local_change, ChangeStore, DocObserver,
    Integration, MemoryStore, RebaseConfig,
};
pub use registry::{OpClass, OpHandler, TypeRegistry};
pub use transform::transform_patch;
