//! Local edit -> ops: a structural diff between two `serde_json::Value`
//! trees, used by the "local edit" step of the rebase loop (spec §4.E)
//! to turn a user-mutated draft into a patch.
//!
//! Grounded on the teacher's `json_patch_diff` module: same recursive
//! per-type dispatch (string/object/array/scalar), same object diff
//! (remove keys dropped from `dst`, add/recurse for the rest). Arrays and
//! strings are simplified to a common-prefix/common-suffix trim rather
//! than the teacher's line-diff/char-diff machinery, since that machinery
//! lives in a separate utility crate this workspace doesn't carry; the
//! trim still finds the minimal untouched edges and only pays the index-
//! shift cost on the differing span in the middle.

use crate::patch::Op;
use crate::text::{InsertContent, TextOp};
use serde_json::Value;

/// Ops that turn `src` into `dst` when applied in order.
pub fn diff(src: &Value, dst: &Value) -> Vec<Op> {
    let mut ops = Vec::new();
    diff_at(&mut ops, &[], src, dst);
    ops
}

fn diff_at(ops: &mut Vec<Op>, path: &[String], src: &Value, dst: &Value) {
    if src == dst {
        return;
    }
    match (src, dst) {
        (Value::String(s), Value::String(d)) => diff_str(ops, path, s, d),
        (Value::Object(s), Value::Object(d)) => diff_obj(ops, path, s, d),
        (Value::Array(s), Value::Array(d)) => diff_arr(ops, path, s, d),
        _ => ops.push(Op::Replace { path: path.to_vec(), value: dst.clone() }),
    }
}

fn diff_str(ops: &mut Vec<Op>, path: &[String], src: &str, dst: &str) {
    let src_chars: Vec<char> = src.chars().collect();
    let dst_chars: Vec<char> = dst.chars().collect();

    let mut prefix = 0;
    while prefix < src_chars.len() && prefix < dst_chars.len() && src_chars[prefix] == dst_chars[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < src_chars.len() - prefix
        && suffix < dst_chars.len() - prefix
        && src_chars[src_chars.len() - 1 - suffix] == dst_chars[dst_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let delete_len = src_chars.len() - prefix - suffix;
    let insert: String = dst_chars[prefix..dst_chars.len() - suffix].iter().collect();

    let mut delta = Vec::new();
    if prefix > 0 {
        delta.push(TextOp::Retain(prefix, None));
    }
    if delete_len > 0 {
        delta.push(TextOp::Delete(delete_len));
    }
    if !insert.is_empty() {
        delta.push(TextOp::Insert(InsertContent::Text(insert), None));
    }
    if delta.is_empty() {
        return;
    }
    ops.push(Op::Text { path: path.to_vec(), delta });
}

fn diff_obj(
    ops: &mut Vec<Op>,
    path: &[String],
    src: &serde_json::Map<String, Value>,
    dst: &serde_json::Map<String, Value>,
) {
    for key in src.keys() {
        if !dst.contains_key(key) {
            let mut p = path.to_vec();
            p.push(key.clone());
            ops.push(Op::Remove { path: p });
        }
    }
    for (key, dst_val) in dst {
        let mut p = path.to_vec();
        p.push(key.clone());
        match src.get(key) {
            None => ops.push(Op::Add { path: p, value: dst_val.clone(), soft: false }),
            Some(src_val) => diff_at(ops, &p, src_val, dst_val),
        }
    }
}

fn diff_arr(ops: &mut Vec<Op>, path: &[String], src: &[Value], dst: &[Value]) {
    if src == dst {
        return;
    }
    let mut prefix = 0;
    while prefix < src.len() && prefix < dst.len() && src[prefix] == dst[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < src.len() - prefix
        && suffix < dst.len() - prefix
        && src[src.len() - 1 - suffix] == dst[dst.len() - 1 - suffix]
    {
        suffix += 1;
    }

    // Remove the differing middle span from src (back to front, so
    // earlier removals don't shift the indices of later ones), then add
    // dst's differing middle span at the same position.
    for i in (prefix..src.len() - suffix).rev() {
        let mut p = path.to_vec();
        p.push(i.to_string());
        ops.push(Op::Remove { path: p });
    }
    for (offset, value) in dst[prefix..dst.len() - suffix].iter().enumerate() {
        let mut p = path.to_vec();
        p.push((prefix + offset).to_string());
        ops.push(Op::Add { path: p, value: value.clone(), soft: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::patch::{apply_patch, ApplyOptions};
    use crate::registry::TypeRegistry;
    use serde_json::json;

    fn roundtrip(src: Value, dst: Value) {
        let ops = diff(&src, &dst);
        let root = Node::from_value(src);
        let result = apply_patch(&root, &ops, ApplyOptions { strict: true }, &TypeRegistry::new()).unwrap();
        assert_eq!(result.to_value(), dst);
    }

    #[test]
    fn equal_docs_produce_no_ops() {
        assert!(diff(&json!({"a": 1}), &json!({"a": 1})).is_empty());
    }

    #[test]
    fn object_add_remove_and_recurse_roundtrip() {
        roundtrip(
            json!({"name": "Alice", "age": 30}),
            json!({"name": "Bob", "age": 30, "city": "NYC"}),
        );
    }

    #[test]
    fn array_insert_and_delete_roundtrip() {
        roundtrip(json!([1, 2, 3]), json!([1, 99, 2, 3]));
        roundtrip(json!([1, 2, 3]), json!([1, 3]));
    }

    #[test]
    fn string_change_emits_text_op() {
        let ops = diff(&json!("hello world"), &json!("hello rust"));
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], Op::Text { .. }));
    }

    #[test]
    fn string_change_roundtrips_through_apply() {
        let root = Node::from_value(json!({"doc": "hello world"}));
        let ops = diff(&json!("hello world"), &json!("hello rust"));
        let result = apply_patch(&root, &ops, ApplyOptions { strict: true }, &TypeRegistry::new());
        // The diff is at root level; re-anchor the op under "/doc" for this check.
        let reanchored: Vec<Op> = ops
            .into_iter()
            .map(|op| match op {
                Op::Text { delta, .. } => Op::Text { path: vec!["doc".to_string()], delta },
                other => other,
            })
            .collect();
        let result = apply_patch(&root, &reanchored, ApplyOptions { strict: true }, &TypeRegistry::new()).unwrap();
        assert_eq!(result.to_value(), json!({"doc": "hello rust"}));
        let _ = result;
    }
}
