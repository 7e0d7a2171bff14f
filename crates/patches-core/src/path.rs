//! Path arithmetic and COW navigation over [`Node`](crate::node::Node).
//!
//! Token parsing and the basic ancestor relations are delegated to
//! `patches-json-pointer`; this module adds the array-index arithmetic and
//! the mutable-navigation helpers the operators need.

use crate::error::OpError;
use crate::node::Node;
use std::rc::Rc;

pub use patches_json_pointer::{is_child, is_path_equal, is_root};

/// Builds a `Vec<String>` path from its components, e.g. `path!["a", "b", 0]`.
/// A plain convenience constructor, not a typed path-builder DSL.
#[macro_export]
macro_rules! path {
    ($($token:expr),* $(,)?) => {
        vec![$($token.to_string()),*]
    };
}

/// `-` resolves to `len` (array append); a decimal token resolves to its
/// integer value; anything else is not a valid index.
pub fn to_array_index(len: usize, token: &str) -> Option<usize> {
    if token == "-" {
        Some(len)
    } else if patches_json_pointer::is_valid_index(token) {
        token.parse::<usize>().ok()
    } else {
        None
    }
}

fn path_string(path: &[String]) -> String {
    patches_json_pointer::format_json_pointer(path)
}

/// Read-only navigation to the node at `path`. `None` if any step is missing.
pub fn get<'a>(root: &'a Node, path: &[String]) -> Option<&'a Node> {
    let mut current = root;
    for token in path {
        current = match current {
            Node::Object(map) => map.get(token)?,
            Node::Array(arr) => {
                let idx = to_array_index(arr.len(), token)?;
                arr.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable, copy-on-write navigation to the node at `path`. Every container
/// visited along the way is cloned at most once per call to `Rc::make_mut`
/// (a no-op clone when this call already holds the sole reference).
pub fn navigate_mut<'a>(root: &'a mut Node, path: &[String]) -> Result<&'a mut Node, OpError> {
    let mut current = root;
    for token in path {
        current = match current {
            Node::Object(map) => {
                let map = Rc::make_mut(map);
                map.get_mut(token)
                    .ok_or_else(|| OpError::PathNotFound(path_string(path)))?
            }
            Node::Array(arr) => {
                let len = arr.len();
                let idx = to_array_index(len, token)
                    .ok_or_else(|| OpError::InvalidArrayIndex(path_string(path)))?;
                let arr = Rc::make_mut(arr);
                arr.get_mut(idx)
                    .ok_or_else(|| OpError::PathNotFound(path_string(path)))?
            }
            _ => return Err(OpError::PathNotFound(path_string(path))),
        };
    }
    Ok(current)
}

/// Mutable navigation to the *parent* container of `path`, along with the
/// final (unparsed) path token. Used by `add`/`remove`, which splice the
/// parent container rather than replace the target node in place.
///
/// Returns `None` parent-token pair semantics mirror the spec's
/// `getOpData`: the caller receives `(parent, last_token)` and is
/// responsible for further index arithmetic against the parent's current
/// shape (its length may itself depend on prior ops in the same patch).
pub fn navigate_mut_parent<'a>(
    root: &'a mut Node,
    path: &[String],
) -> Result<(&'a mut Node, &'a str), OpError> {
    let (last, prefix) = path
        .split_last()
        .ok_or_else(|| OpError::InvalidPath("cannot target the root".to_string()))?;
    let parent = navigate_mut(root, prefix)?;
    Ok((parent, last))
}

/// Shift an array index path token up by one when a concurrent `add` at the
/// same array inserted below it. `None` if not an array-index descendant of
/// `array_path` or already below the threshold.
pub fn bump_array_path(array_path: &[String], at_index: usize, path: &[String]) -> Option<Vec<String>> {
    shift_array_path(array_path, at_index, path, 1)
}

/// Shift an array index path token down by one when a concurrent `remove`
/// at the same array deleted below it.
pub fn lower_array_path(array_path: &[String], at_index: usize, path: &[String]) -> Option<Vec<String>> {
    shift_array_path(array_path, at_index, path, -1)
}

fn shift_array_path(
    array_path: &[String],
    at_index: usize,
    path: &[String],
    delta: i64,
) -> Option<Vec<String>> {
    if path.len() <= array_path.len() {
        return None;
    }
    if &path[..array_path.len()] != array_path {
        return None;
    }
    let idx_token = &path[array_path.len()];
    if !patches_json_pointer::is_valid_index(idx_token) {
        return None;
    }
    let idx: i64 = idx_token.parse().ok()?;
    if idx < at_index as i64 {
        return None;
    }
    let mut shifted = path.to_vec();
    shifted[array_path.len()] = (idx + delta).to_string();
    Some(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Vec<String> {
        patches_json_pointer::parse_json_pointer(s)
    }

    #[test]
    fn to_array_index_handles_dash_and_digits() {
        assert_eq!(to_array_index(3, "-"), Some(3));
        assert_eq!(to_array_index(3, "1"), Some(1));
        assert_eq!(to_array_index(3, "abc"), None);
        assert_eq!(to_array_index(3, "-1"), None);
    }

    #[test]
    fn get_walks_nested_structure() {
        let root = Node::from_value(json!({"a": [1, {"b": 2}]}));
        let v = get(&root, &p("/a/1/b")).unwrap();
        assert_eq!(v.as_i64(), Some(2));
        assert!(get(&root, &p("/missing")).is_none());
    }

    #[test]
    fn navigate_mut_shares_untouched_subtrees() {
        let mut root = Node::from_value(json!({"a": {"x": 1}, "b": {"y": 2}}));
        let original_b = match &root {
            Node::Object(o) => o.get("b").unwrap().clone(),
            _ => unreachable!(),
        };
        {
            let a = navigate_mut(&mut root, &p("/a/x")).unwrap();
            *a = Node::from_value(json!(99));
        }
        let b_after = match &root {
            Node::Object(o) => o.get("b").unwrap(),
            _ => unreachable!(),
        };
        if let (Node::Object(orig), Node::Object(after)) = (&original_b, b_after) {
            assert!(Rc::ptr_eq(orig, after));
        } else {
            panic!("expected objects");
        }
    }

    #[test]
    fn navigate_mut_parent_splits_last_token() {
        let mut root = Node::from_value(json!({"a": {"b": 1}}));
        let (parent, last) = navigate_mut_parent(&mut root, &p("/a/b")).unwrap();
        assert_eq!(last, "b");
        assert!(matches!(parent, Node::Object(_)));
    }

    #[test]
    fn bump_array_path_shifts_descendant_index() {
        let arr = p("/items");
        let path = p("/items/2/name");
        let bumped = bump_array_path(&arr, 1, &path).unwrap();
        assert_eq!(bumped, p("/items/3/name"));

        // below the insertion point: untouched
        assert!(bump_array_path(&arr, 5, &path).is_none());

        // unrelated path
        assert!(bump_array_path(&arr, 0, &p("/other/2")).is_none());
    }

    #[test]
    fn lower_array_path_shifts_descendant_index_down() {
        let arr = p("/items");
        let path = p("/items/3/name");
        let lowered = lower_array_path(&arr, 1, &path).unwrap();
        assert_eq!(lowered, p("/items/2/name"));
    }
}
