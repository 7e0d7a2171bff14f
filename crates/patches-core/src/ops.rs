//! `apply`, `invert`, and `compose` for every built-in opcode plus custom
//! ones routed through the [`TypeRegistry`]. Mirrors the shape of a
//! JSON-Patch apply module: one function per operator, a dispatcher on top.

use crate::error::OpError;
use crate::node::Node;
use crate::patch::Op;
use crate::path::{self, to_array_index};
use crate::registry::{OpClass, TypeRegistry};
use crate::text::{self, TextOp};
use serde_json::Value;
use std::rc::Rc;

fn path_string(path: &[String]) -> String {
    patches_json_pointer::format_json_pointer(path)
}

/// Insert `value` into the parent container addressed by `path`'s last
/// token, splicing arrays or assigning object keys. `soft` implements the
/// "create if absent, merge if already an equal-shaped empty container"
/// rule.
fn splice_add(root: &mut Node, path: &[String], value: Node, soft: bool) -> Result<(), OpError> {
    let (parent, last) = path::navigate_mut_parent(root, path)?;
    match parent {
        Node::Object(map) => {
            let map = Rc::make_mut(map);
            if soft {
                if let Some(existing) = map.get(last) {
                    if existing.is_empty_container() && value.is_empty_container() {
                        return Ok(()); // merge: keep the existing empty container
                    }
                }
            }
            map.insert(last.to_string(), value);
            Ok(())
        }
        Node::Array(arr) => {
            let arr = Rc::make_mut(arr);
            let idx = to_array_index(arr.len(), last)
                .ok_or_else(|| OpError::InvalidArrayIndex(path_string(path)))?;
            if idx > arr.len() {
                return Err(OpError::InvalidArrayIndex(path_string(path)));
            }
            arr.insert(idx, value);
            Ok(())
        }
        _ => Err(OpError::PathNotFound(path_string(path))),
    }
}

/// Remove and return the value at `path`'s last token from its parent
/// container.
fn splice_remove(root: &mut Node, path: &[String]) -> Result<Node, OpError> {
    let (parent, last) = path::navigate_mut_parent(root, path)?;
    match parent {
        Node::Object(map) => {
            let map = Rc::make_mut(map);
            map.shift_remove(last)
                .ok_or_else(|| OpError::PathNotFound(path_string(path)))
        }
        Node::Array(arr) => {
            let arr = Rc::make_mut(arr);
            let idx = to_array_index(arr.len(), last)
                .filter(|i| *i < arr.len())
                .ok_or_else(|| OpError::InvalidArrayIndex(path_string(path)))?;
            Ok(arr.remove(idx))
        }
        _ => Err(OpError::PathNotFound(path_string(path))),
    }
}

/// Materialize the actual array index a `-`-terminated add path resolved
/// to, for use by `invert` (which must remove from a concrete index, not
/// re-resolve `-` against the now-mutated array).
fn materialize_append_path(root: &Node, path: &[String]) -> Vec<String> {
    if path.last().map(|s| s.as_str()) != Some("-") {
        return path.to_vec();
    }
    let parent_path = &path[..path.len() - 1];
    if let Some(Node::Array(arr)) = path::get(root, parent_path) {
        let mut materialized = path.to_vec();
        *materialized.last_mut().unwrap() = (arr.len() - 1).to_string();
        materialized
    } else {
        path.to_vec()
    }
}

pub fn apply(root: &mut Node, op: &Op, registry: &TypeRegistry) -> Result<(), OpError> {
    match op {
        Op::Add { path, value, soft } => {
            splice_add(root, path, Node::from_value(value.clone()), *soft)
        }
        Op::Remove { path } => splice_remove(root, path).map(|_| ()),
        Op::Replace { path, value } => {
            let target = path::navigate_mut(root, path)?;
            *target = Node::from_value(value.clone());
            Ok(())
        }
        Op::Move { path, from } => {
            if path == from {
                return Ok(());
            }
            let value = splice_remove(root, from)?;
            splice_add(root, path, value, false)
        }
        Op::Copy { path, from } => {
            let value = path::get(root, from)
                .cloned()
                .ok_or_else(|| OpError::PathNotFound(path_string(from)))?;
            splice_add(root, path, value, false)
        }
        Op::Test { path, value } => {
            let found = path::get(root, path)
                .ok_or_else(|| OpError::PathNotFound(path_string(path)))?;
            let found_value = found.to_value();
            if !patches_util::deep_equal(&found_value, value) {
                return Err(OpError::TestFailed {
                    path: path_string(path),
                    expected: value.to_string(),
                    found: found_value.to_string(),
                });
            }
            Ok(())
        }
        Op::Increment { path, delta } => {
            let target = path::navigate_mut(root, path)?;
            let current = target.as_f64().unwrap_or(0.0);
            let updated = current + delta;
            *target = Node::Number(
                serde_json::Number::from_f64(updated)
                    .ok_or_else(|| OpError::InvalidOpValue(path_string(path), "non-finite result".to_string()))?,
            );
            Ok(())
        }
        Op::Bit { path, mask } => {
            let target = path::navigate_mut(root, path)?;
            let current = target.as_i64().unwrap_or(0) as u32;
            let on_mask = mask & 0x7FFF;
            let off_mask = (mask >> 15) & 0x7FFF;
            let updated = (current & !off_mask) | on_mask;
            *target = Node::Number(updated.into());
            Ok(())
        }
        Op::Min { path, value } => {
            let target = path::navigate_mut(root, path)?;
            let candidate = value
                .as_f64()
                .ok_or_else(|| OpError::InvalidOpValue(path_string(path), "expected a number".to_string()))?;
            let apply = match target.as_f64() {
                None => true,
                Some(current) => candidate < current,
            };
            if apply {
                *target = Node::from_value(value.clone());
            }
            Ok(())
        }
        Op::Max { path, value } => {
            let target = path::navigate_mut(root, path)?;
            let candidate = value
                .as_f64()
                .ok_or_else(|| OpError::InvalidOpValue(path_string(path), "expected a number".to_string()))?;
            let apply = match target.as_f64() {
                None => true,
                Some(current) => candidate > current,
            };
            if apply {
                *target = Node::from_value(value.clone());
            }
            Ok(())
        }
        Op::Text { path, delta } => {
            let target = path::navigate_mut(root, path)?;
            let doc = node_to_text_doc(target, path)?;
            let composed = text::compose(&doc, delta);
            *target = text_doc_to_node(&composed);
            Ok(())
        }
        Op::Custom(custom) => {
            let handler = registry
                .get(&custom.opcode)
                .ok_or_else(|| OpError::UnknownOpcode(custom.opcode.clone()))?;
            match handler.like() {
                OpClass::Add => {
                    let value = custom
                        .value
                        .clone()
                        .ok_or_else(|| OpError::InvalidOpValue(custom.opcode.clone(), "missing value".to_string()))?;
                    splice_add(root, &custom.path, Node::from_value(value), custom.soft)
                }
                OpClass::Remove => splice_remove(root, &custom.path).map(|_| ()),
                OpClass::Move => {
                    let from = custom
                        .from
                        .clone()
                        .ok_or_else(|| OpError::InvalidOpValue(custom.opcode.clone(), "missing from".to_string()))?;
                    let value = splice_remove(root, &from)?;
                    splice_add(root, &custom.path, value, false)
                }
                OpClass::Copy => {
                    let from = custom
                        .from
                        .clone()
                        .ok_or_else(|| OpError::InvalidOpValue(custom.opcode.clone(), "missing from".to_string()))?;
                    let value = path::get(root, &from)
                        .cloned()
                        .ok_or_else(|| OpError::PathNotFound(path_string(&from)))?;
                    splice_add(root, &custom.path, value, false)
                }
                OpClass::Test => {
                    let found = path::get(root, &custom.path)
                        .ok_or_else(|| OpError::PathNotFound(path_string(&custom.path)))?;
                    let expected_value = custom.value.clone().unwrap_or(Value::Null);
                    let found_value = found.to_value();
                    if !patches_util::deep_equal(&found_value, &expected_value) {
                        return Err(OpError::TestFailed {
                            path: path_string(&custom.path),
                            expected: expected_value.to_string(),
                            found: found_value.to_string(),
                        });
                    }
                    Ok(())
                }
                OpClass::Replace => {
                    let target = path::navigate_mut(root, &custom.path)?;
                    let current = target.to_value();
                    let value = custom.value.clone().unwrap_or(Value::Null);
                    let updated = handler
                        .apply(Some(&current), &value)
                        .map_err(|e| OpError::InvalidOpValue(custom.opcode.clone(), e))?;
                    *target = Node::from_value(updated);
                    Ok(())
                }
            }
        }
    }
}

fn node_to_text_doc(node: &Node, path: &[String]) -> Result<Vec<TextOp>, OpError> {
    match node {
        Node::Null => Ok(Vec::new()),
        Node::String(s) => Ok(vec![TextOp::Insert(
            text::InsertContent::Text(s.to_string()),
            None,
        )]),
        Node::Array(_) => text::from_value(&node.to_value()),
        _ => Err(OpError::InvalidOpValue(
            path_string(path),
            "@txt target must be a string, delta array, or absent".to_string(),
        )),
    }
}

fn text_doc_to_node(doc: &[TextOp]) -> Node {
    Node::from_value(text::to_value(doc))
}

/// Produce the inverse of `op` given the pre-apply state `root`. Returns
/// `None` for ops that never mutate (`test`).
pub fn invert(root: &Node, op: &Op, registry: &TypeRegistry) -> Result<Option<Op>, OpError> {
    match op {
        Op::Add { path, value, soft } => {
            if *soft {
                if let Some(existing) = path::get(root, path) {
                    let incoming = Node::from_value(value.clone());
                    if existing.is_empty_container() && incoming.is_empty_container() {
                        return Ok(None); // merge is a no-op, nothing to undo
                    }
                }
            }
            let materialized = materialize_append_path(root, path);
            Ok(Some(Op::Remove { path: materialized }))
        }
        Op::Remove { path } => {
            let old = path::get(root, path)
                .cloned()
                .ok_or_else(|| OpError::PathNotFound(path_string(path)))?;
            Ok(Some(Op::Add {
                path: path.clone(),
                value: old.to_value(),
                soft: false,
            }))
        }
        Op::Replace { path, value: _ } => {
            let old = path::get(root, path).cloned();
            Ok(Some(match old {
                Some(old) => Op::Replace {
                    path: path.clone(),
                    value: old.to_value(),
                },
                None => Op::Remove { path: path.clone() },
            }))
        }
        Op::Move { path, from } => {
            if path == from {
                return Ok(None);
            }
            Ok(Some(Op::Move {
                path: from.clone(),
                from: path.clone(),
            }))
        }
        Op::Copy { path, .. } => {
            let materialized = materialize_append_path(root, path);
            Ok(Some(Op::Remove { path: materialized }))
        }
        Op::Test { .. } => Ok(None),
        Op::Increment { path, delta } => Ok(Some(Op::Increment {
            path: path.clone(),
            delta: -delta,
        })),
        Op::Bit { path, .. } => {
            let current = path::get(root, path)
                .and_then(Node::as_i64)
                .unwrap_or(0) as u32;
            // Restore every bit to its prior state: clear bits not set
            // before, set bits that were set before.
            let on_mask = current & 0x7FFF;
            let off_mask = (!current) & 0x7FFF;
            Ok(Some(Op::Bit {
                path: path.clone(),
                mask: on_mask | (off_mask << 15),
            }))
        }
        Op::Min { path, .. } | Op::Max { path, .. } => {
            let old = path::get(root, path).cloned();
            Ok(Some(match old {
                Some(old) => Op::Replace {
                    path: path.clone(),
                    value: old.to_value(),
                },
                None => Op::Remove { path: path.clone() },
            }))
        }
        Op::Text { path, delta } => {
            let target = path::get(root, path);
            let doc_before = match target {
                Some(node) => node_to_text_doc(node, path)?,
                None => Vec::new(),
            };
            let doc_after = text::compose(&doc_before, delta);
            Ok(Some(Op::Text {
                path: path.clone(),
                delta: text::invert(&doc_before, text::doc_len(&doc_after)),
            }))
        }
        Op::Custom(custom) => {
            let handler = registry
                .get(&custom.opcode)
                .ok_or_else(|| OpError::UnknownOpcode(custom.opcode.clone()))?;
            match handler.like() {
                OpClass::Test => Ok(None),
                OpClass::Remove | OpClass::Copy => {
                    let materialized = materialize_append_path(root, &custom.path);
                    Ok(Some(Op::Remove { path: materialized }))
                }
                OpClass::Add => {
                    let materialized = materialize_append_path(root, &custom.path);
                    Ok(Some(Op::Remove { path: materialized }))
                }
                OpClass::Move => {
                    let from = custom.from.clone().unwrap_or_default();
                    Ok(Some(Op::Move {
                        path: from,
                        from: custom.path.clone(),
                    }))
                }
                OpClass::Replace => {
                    let old = path::get(root, &custom.path).cloned();
                    Ok(Some(match old {
                        Some(old) => Op::Replace {
                            path: custom.path.clone(),
                            value: old.to_value(),
                        },
                        None => Op::Remove {
                            path: custom.path.clone(),
                        },
                    }))
                }
            }
        }
    }
}

/// Collapse two adjacent same-path ops into one, when the opcode has a
/// compose law. `None` means "cannot compose — flush the cache".
pub fn compose(a: &Op, b: &Op, registry: &TypeRegistry) -> Option<Op> {
    match (a, b) {
        (Op::Increment { path, delta: d1 }, Op::Increment { delta: d2, .. }) => {
            Some(Op::Increment { path: path.clone(), delta: d1 + d2 })
        }
        (Op::Bit { path, mask: m1 }, Op::Bit { mask: m2, .. }) => {
            let a_on = m1 & 0x7FFF;
            let a_off = (m1 >> 15) & 0x7FFF;
            let b_on = m2 & 0x7FFF;
            let b_off = (m2 >> 15) & 0x7FFF;
            let on_combined = (a_on & !b_off) | b_on;
            let off_combined = (a_off & !b_on) | b_off;
            Some(Op::Bit {
                path: path.clone(),
                mask: on_combined | (off_combined << 15),
            })
        }
        (Op::Min { path, .. }, Op::Min { value, .. }) => Some(Op::Min {
            path: path.clone(),
            value: value.clone(),
        }),
        (Op::Max { path, .. }, Op::Max { value, .. }) => Some(Op::Max {
            path: path.clone(),
            value: value.clone(),
        }),
        (Op::Replace { path, .. }, Op::Replace { value, .. }) => Some(Op::Replace {
            path: path.clone(),
            value: value.clone(),
        }),
        (Op::Text { path, delta: d1 }, Op::Text { delta: d2, .. }) => Some(Op::Text {
            path: path.clone(),
            delta: text::compose(d1, d2),
        }),
        (Op::Custom(c1), Op::Custom(c2)) if c1.opcode == c2.opcode => {
            let handler = registry.get(&c1.opcode)?;
            let v1 = c1.value.clone().unwrap_or(Value::Null);
            let v2 = c2.value.clone().unwrap_or(Value::Null);
            let composed = handler.compose(&v1, &v2)?;
            Some(Op::Custom(crate::patch::CustomOp {
                value: Some(composed),
                ..c2.clone()
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Vec<String> {
        patches_json_pointer::parse_json_pointer(s)
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
    }

    #[test]
    fn add_to_object_key() {
        let mut root = Node::from_value(json!({"a": 1}));
        apply(&mut root, &Op::Add { path: p("/b"), value: json!(2), soft: false }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn add_append_to_array() {
        let mut root = Node::from_value(json!({"a": [1, 2]}));
        apply(&mut root, &Op::Add { path: p("/a/-"), value: json!(3), soft: false }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn add_invalid_index_errors() {
        let mut root = Node::from_value(json!({"a": [1, 2]}));
        let err = apply(&mut root, &Op::Add { path: p("/a/9"), value: json!(3), soft: false }, &registry());
        assert!(matches!(err, Err(OpError::InvalidArrayIndex(_))));
    }

    #[test]
    fn remove_from_array_shifts_left() {
        let mut root = Node::from_value(json!({"a": [1, 2, 3]}));
        apply(&mut root, &Op::Remove { path: p("/a/1") }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"a": [1, 3]}));
    }

    #[test]
    fn move_within_same_array() {
        let mut root = Node::from_value(json!({"matrix": [[0, 1, 2], [3, 4, 5], [6, 7, 8]]}));
        apply(
            &mut root,
            &Op::Move { path: p("/matrix/1/-"), from: p("/matrix/2/0") },
            &registry(),
        )
        .unwrap();
        assert_eq!(
            root.to_value(),
            json!({"matrix": [[0, 1, 2], [3, 4, 5, 6], [7, 8]]})
        );
    }

    #[test]
    fn test_op_passes_on_match_fails_on_mismatch() {
        let mut root = Node::from_value(json!({"a": 1}));
        apply(&mut root, &Op::Test { path: p("/a"), value: json!(1) }, &registry()).unwrap();
        let err = apply(&mut root, &Op::Test { path: p("/a"), value: json!(2) }, &registry());
        assert!(matches!(err, Err(OpError::TestFailed { .. })));
    }

    #[test]
    fn increment_defaults_to_zero() {
        let mut root = Node::from_value(json!({}));
        apply(&mut root, &Op::Increment { path: p("/n"), delta: 1.0 }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"n": 1.0}));
    }

    #[test]
    fn bit_sets_and_clears() {
        let mut root = Node::from_value(json!({"m": {"x": 0}}));
        apply(&mut root, &Op::Bit { path: p("/m/x"), mask: 4 }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"m": {"x": 4}}));

        let mut root = Node::from_value(json!({"m": {"x": 5}}));
        apply(&mut root, &Op::Bit { path: p("/m/x"), mask: 131072 }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"m": {"x": 1}}));
    }

    #[test]
    fn min_max_idempotent() {
        let mut root = Node::from_value(json!({"v": 5}));
        apply(&mut root, &Op::Min { path: p("/v"), value: json!(3) }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"v": 3}));
        apply(&mut root, &Op::Min { path: p("/v"), value: json!(3) }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"v": 3}));
        apply(&mut root, &Op::Min { path: p("/v"), value: json!(10) }, &registry()).unwrap();
        assert_eq!(root.to_value(), json!({"v": 3}));
    }

    #[test]
    fn apply_then_invert_is_identity() {
        let original = json!({"a": [1, 2, 3], "b": {"c": "hello"}});
        let ops = vec![
            Op::Add { path: p("/b/d"), value: json!(true), soft: false },
            Op::Remove { path: p("/a/0") },
            Op::Replace { path: p("/b/c"), value: json!("world") },
        ];
        let mut root = Node::from_value(original.clone());
        let mut inverses = Vec::new();
        for op in &ops {
            inverses.push(invert(&root, op, &registry()).unwrap());
            apply(&mut root, op, &registry()).unwrap();
        }
        for inv in inverses.into_iter().rev().flatten() {
            apply(&mut root, &inv, &registry()).unwrap();
        }
        assert_eq!(root.to_value(), original);
    }

    #[test]
    fn text_op_applies_delta_to_string() {
        let mut root = Node::from_value(json!({"doc": "Hello world"}));
        let delta = text::from_value(&json!([
            {"retain": 6},
            {"insert": "there "}
        ]))
        .unwrap();
        apply(&mut root, &Op::Text { path: p("/doc"), delta }, &registry()).unwrap();
        assert_eq!(
            root.to_value(),
            json!({"doc": [{"insert": "Hello there world"}]})
        );
    }
}
