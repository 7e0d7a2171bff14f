//! The logical document root, represented as a persistent, reference-counted
//! tree so that mutation during an apply session shares structure with the
//! pre-mutation state everywhere it didn't touch.
//!
//! `Rc::make_mut` gives us the "shallow-copy-on-write" contract directly: a
//! container clones only the first time it is mutated while shared (refcount
//! > 1); every subsequent mutation within the same session reuses the unique
//! clone. No side-table of visited pointers is needed.

use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Array(Rc<Vec<Node>>),
    Object(Rc<IndexMap<String, Node>>),
}

impl Node {
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    /// True if this is an empty array or empty object — used by the
    /// add-operator's "create if absent" soft-write rule.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Node::Array(a) => a.is_empty(),
            Node::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.to_string()),
            Node::Array(a) => Value::Array(a.iter().map(Node::to_value).collect()),
            Node::Object(o) => {
                Value::Object(o.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
            }
        }
    }

    pub fn from_value(value: Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(Rc::from(s.as_str())),
            Value::Array(a) => Node::Array(Rc::new(a.into_iter().map(Node::from_value).collect())),
            Value::Object(o) => Node::Object(Rc::new(
                o.into_iter().map(|(k, v)| (k, Node::from_value(v))).collect(),
            )),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_value(value)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        node.to_value()
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        node.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrips_through_value() {
        let v = json!({"a": [1, 2, {"b": "c"}], "d": null, "e": true});
        let node = Node::from_value(v.clone());
        assert_eq!(node.to_value(), v);
    }

    #[test]
    fn object_equality_is_order_insensitive() {
        let a = Node::from_value(json!({"a": 1, "b": 2}));
        let b = Node::from_value(json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn array_equality_is_order_sensitive() {
        let a = Node::from_value(json!([1, 2]));
        let b = Node::from_value(json!([2, 1]));
        assert_ne!(a, b);
    }

    #[test]
    fn clone_shares_rc_until_mutated() {
        let a = Node::from_value(json!({"x": [1, 2, 3]}));
        let b = a.clone();
        if let (Node::Object(ra), Node::Object(rb)) = (&a, &b) {
            assert!(Rc::ptr_eq(ra, rb));
        } else {
            panic!("expected objects");
        }
    }

    #[test]
    fn empty_container_detection() {
        assert!(Node::from_value(json!([])).is_empty_container());
        assert!(Node::from_value(json!({})).is_empty_container());
        assert!(!Node::from_value(json!([1])).is_empty_container());
    }
}
