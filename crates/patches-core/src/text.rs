//! The `@txt` rich-text delta algebra: a target value is interpreted as an
//! ordered sequence of inserts-with-attributes (a "delta document"), and a
//! `@txt` op is itself a delta of `insert`/`retain`/`delete` pieces applied
//! against it.
//!
//! Neither the teacher crate nor the rest of the example pack carries a
//! text-delta implementation to crib from — this is the standard compose/
//! transform algorithm used by the Quill Delta family of rich-text OT
//! libraries, adapted to this crate's `Value`-based attribute maps. See
//! `DESIGN.md` for the grounding note.

use crate::error::OpError;
use indexmap::IndexMap;
use serde_json::Value;

pub type Attrs = Option<IndexMap<String, Value>>;

#[derive(Debug, Clone, PartialEq)]
pub enum InsertContent {
    Text(String),
    Embed(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextOp {
    Insert(InsertContent, Attrs),
    Retain(usize, Attrs),
    Delete(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Insert,
    Retain,
    Delete,
}

fn op_kind(op: &TextOp) -> Kind {
    match op {
        TextOp::Insert(..) => Kind::Insert,
        TextOp::Retain(..) => Kind::Retain,
        TextOp::Delete(_) => Kind::Delete,
    }
}

fn op_len(op: &TextOp) -> usize {
    match op {
        TextOp::Insert(InsertContent::Text(s), _) => s.chars().count(),
        TextOp::Insert(InsertContent::Embed(_), _) => 1,
        TextOp::Retain(n, _) => *n,
        TextOp::Delete(n) => *n,
    }
}

fn slice(op: &TextOp, start: usize, len: usize) -> TextOp {
    match op {
        TextOp::Insert(InsertContent::Text(s), attrs) => {
            let chars: Vec<char> = s.chars().collect();
            let sub: String = chars[start..start + len].iter().collect();
            TextOp::Insert(InsertContent::Text(sub), attrs.clone())
        }
        TextOp::Insert(InsertContent::Embed(v), attrs) => {
            TextOp::Insert(InsertContent::Embed(v.clone()), attrs.clone())
        }
        TextOp::Retain(_, attrs) => TextOp::Retain(len, attrs.clone()),
        TextOp::Delete(_) => TextOp::Delete(len),
    }
}

struct Cursor<'a> {
    ops: &'a [TextOp],
    idx: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(ops: &'a [TextOp]) -> Self {
        Self { ops, idx: 0, offset: 0 }
    }

    fn has_next(&self) -> bool {
        self.idx < self.ops.len()
    }

    fn peek_kind(&self) -> Option<Kind> {
        self.ops.get(self.idx).map(op_kind)
    }

    fn peek_len(&self) -> usize {
        match self.ops.get(self.idx) {
            Some(op) => op_len(op) - self.offset,
            None => usize::MAX,
        }
    }

    fn next_len(&mut self, max: usize) -> TextOp {
        let op = &self.ops[self.idx];
        let remaining = op_len(op) - self.offset;
        let take = remaining.min(max);
        let piece = slice(op, self.offset, take);
        self.offset += take;
        if self.offset >= op_len(op) {
            self.idx += 1;
            self.offset = 0;
        }
        piece
    }
}

fn compose_attrs(a: &Attrs, b: &Attrs) -> Attrs {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                if v.is_null() {
                    merged.shift_remove(k);
                } else {
                    merged.insert(k.clone(), v.clone());
                }
            }
            if merged.is_empty() {
                None
            } else {
                Some(merged)
            }
        }
    }
}

/// Drop from `b` any key also present in `a` — used when the op being
/// transformed against already holds the tie-break, so its attribute
/// changes on shared keys are authoritative.
fn transform_attrs(a: &Attrs, b: &Attrs, a_wins_ties: bool) -> Attrs {
    if !a_wins_ties {
        return b.clone();
    }
    match (a, b) {
        (Some(a), Some(b)) => {
            let filtered: IndexMap<String, Value> = b
                .iter()
                .filter(|(k, _)| !a.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if filtered.is_empty() {
                None
            } else {
                Some(filtered)
            }
        }
        _ => b.clone(),
    }
}

fn push(result: &mut Vec<TextOp>, op: TextOp) {
    if op_len(&op) == 0 && !matches!(op, TextOp::Insert(InsertContent::Embed(_), _)) {
        return;
    }
    if let Some(last) = result.last_mut() {
        match (last, &op) {
            (TextOp::Delete(a), TextOp::Delete(b)) => {
                *a += b;
                return;
            }
            (TextOp::Retain(a, attrs_a), TextOp::Retain(b, attrs_b)) if attrs_a == attrs_b => {
                *a += b;
                return;
            }
            (
                TextOp::Insert(InsertContent::Text(a), attrs_a),
                TextOp::Insert(InsertContent::Text(b), attrs_b),
            ) if attrs_a == attrs_b => {
                a.push_str(b);
                return;
            }
            _ => {}
        }
    }
    result.push(op);
}

fn chop(mut ops: Vec<TextOp>) -> Vec<TextOp> {
    if let Some(TextOp::Retain(_, None)) = ops.last() {
        ops.pop();
    }
    ops
}

/// Compose two deltas, or apply a delta to a document (a document is simply
/// a delta made only of `Insert` ops).
pub fn compose(a: &[TextOp], b: &[TextOp]) -> Vec<TextOp> {
    let mut result = Vec::new();
    let mut ia = Cursor::new(a);
    let mut ib = Cursor::new(b);

    while ia.has_next() || ib.has_next() {
        // Degenerate zero-length ops (e.g. an explicit delete(0)) carry no
        // effect; drop them without letting them force `len` to zero below.
        if ib.has_next() && ib.peek_len() == 0 {
            ib.next_len(0);
            continue;
        }
        if ia.has_next() && ia.peek_len() == 0 {
            ia.next_len(0);
            continue;
        }
        if ib.peek_kind() == Some(Kind::Insert) {
            push(&mut result, ib.next_len(usize::MAX));
            continue;
        }
        if ia.peek_kind() == Some(Kind::Delete) {
            push(&mut result, ia.next_len(usize::MAX));
            continue;
        }
        if !ia.has_next() {
            // `b` addresses content beyond what `a` enumerates; pass it through.
            push(&mut result, ib.next_len(usize::MAX));
            continue;
        }
        if !ib.has_next() {
            // `a` has trailing content `b` never mentions (e.g. an
            // unaddressed document suffix); copy it through unchanged.
            push(&mut result, ia.next_len(usize::MAX));
            continue;
        }
        let len = ia.peek_len().min(ib.peek_len());
        let opa = ia.next_len(len);
        let opb = ib.next_len(len);
        match op_kind(&opb) {
            Kind::Retain => match &opa {
                TextOp::Retain(n, attrs_a) => {
                    let attrs = compose_attrs(attrs_a, attrs_of(&opb));
                    push(&mut result, TextOp::Retain(*n, attrs));
                }
                TextOp::Insert(content, attrs_a) => {
                    let attrs = compose_attrs(attrs_a, attrs_of(&opb));
                    push(&mut result, TextOp::Insert(content.clone(), attrs));
                }
                TextOp::Delete(_) => unreachable!("delete handled above"),
            },
            Kind::Delete => match &opa {
                TextOp::Insert(..) => {} // insert-then-delete cancels
                TextOp::Retain(..) => push(&mut result, TextOp::Delete(len)),
                TextOp::Delete(_) => unreachable!("delete handled above"),
            },
            Kind::Insert => unreachable!("insert handled above"),
        }
    }
    chop(result)
}

/// Drain `ia`'s remaining ops into `result` as plain retains (its deletes
/// are dropped, since there is nothing left to retain past); used when `b`
/// has run out of ops but `a` still has trailing content.
fn drain_as_retain(ia: &mut Cursor, result: &mut Vec<TextOp>) {
    while ia.has_next() {
        let op = ia.next_len(usize::MAX);
        if !matches!(op_kind(&op), Kind::Delete) {
            push(result, TextOp::Retain(op_len(&op), None));
        }
    }
}

fn attrs_of(op: &TextOp) -> &Attrs {
    match op {
        TextOp::Insert(_, a) | TextOp::Retain(_, a) => a,
        TextOp::Delete(_) => &None,
    }
}

/// Rebase `b` so it applies correctly after `a` has already been applied.
/// `a_wins_ties` is true when `a` is the op whose attribute writes take
/// priority on conflicting keys (the "current op wins" rule from the spec).
pub fn transform(a: &[TextOp], b: &[TextOp], a_wins_ties: bool) -> Vec<TextOp> {
    let mut result = Vec::new();
    let mut ia = Cursor::new(a);
    let mut ib = Cursor::new(b);

    while ia.has_next() || ib.has_next() {
        if ib.has_next() && ib.peek_len() == 0 {
            ib.next_len(0);
            continue;
        }
        if ia.has_next() && ia.peek_len() == 0 {
            ia.next_len(0);
            continue;
        }
        if ia.peek_kind() == Some(Kind::Insert)
            && (a_wins_ties || ib.peek_kind() != Some(Kind::Insert))
        {
            let op = ia.next_len(usize::MAX);
            push(&mut result, TextOp::Retain(op_len(&op), None));
            continue;
        }
        if ib.peek_kind() == Some(Kind::Insert) {
            push(&mut result, ib.next_len(usize::MAX));
            continue;
        }
        if !ia.has_next() {
            push(&mut result, ib.next_len(usize::MAX));
            continue;
        }
        if !ib.has_next() {
            drain_as_retain(&mut ia, &mut result);
            continue;
        }
        let len = ia.peek_len().min(ib.peek_len());
        let opa = ia.next_len(len);
        let opb = ib.next_len(len);
        match (op_kind(&opa), op_kind(&opb)) {
            (Kind::Delete, _) => {} // already gone, b's op over this range is void
            (_, Kind::Delete) => push(&mut result, opb),
            _ => {
                let attrs = transform_attrs(attrs_of(&opa), attrs_of(&opb), a_wins_ties);
                push(&mut result, TextOp::Retain(len, attrs));
            }
        }
    }
    chop(result)
}

/// A delta that undoes `delta` given the document it was applied to
/// (`doc_before`, itself an insert-only delta). Implemented as a full
/// replacement (delete everything, re-insert the prior content) rather than
/// a minimal diff — simpler, and sufficient for the apply-then-invert
/// identity the algebra must satisfy.
pub fn invert(doc_before: &[TextOp], current_len: usize) -> Vec<TextOp> {
    let mut inverse = Vec::new();
    if current_len > 0 {
        inverse.push(TextOp::Delete(current_len));
    }
    for op in doc_before {
        if let TextOp::Insert(content, attrs) = op {
            inverse.push(TextOp::Insert(content.clone(), attrs.clone()));
        }
    }
    inverse
}

pub fn doc_len(doc: &[TextOp]) -> usize {
    doc.iter().map(op_len).sum()
}

pub fn to_value(ops: &[TextOp]) -> Value {
    Value::Array(
        ops.iter()
            .map(|op| match op {
                TextOp::Insert(InsertContent::Text(s), attrs) => {
                    text_op_value(Value::String(s.clone()), attrs, "insert")
                }
                TextOp::Insert(InsertContent::Embed(v), attrs) => {
                    text_op_value(v.clone(), attrs, "insert")
                }
                TextOp::Retain(n, attrs) => {
                    text_op_value(Value::from(*n), attrs, "retain")
                }
                TextOp::Delete(n) => serde_json::json!({ "delete": n }),
            })
            .collect(),
    )
}

fn text_op_value(value: Value, attrs: &Attrs, key: &str) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), value);
    if let Some(attrs) = attrs {
        map.insert(
            "attributes".to_string(),
            Value::Object(attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        );
    }
    Value::Object(map)
}

pub fn from_value(value: &Value) -> Result<Vec<TextOp>, OpError> {
    let arr = value
        .as_array()
        .ok_or_else(|| OpError::InvalidOpValue("@txt".to_string(), "expected an array".to_string()))?;
    arr.iter().map(text_op_from_value).collect()
}

fn text_op_from_value(value: &Value) -> Result<TextOp, OpError> {
    let obj = value.as_object().ok_or_else(|| {
        OpError::InvalidOpValue("@txt".to_string(), "expected a delta op object".to_string())
    })?;
    let attrs: Attrs = obj.get("attributes").and_then(|v| v.as_object()).map(|m| {
        m.iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<IndexMap<_, _>>()
    });
    if let Some(v) = obj.get("insert") {
        let content = match v {
            Value::String(s) => InsertContent::Text(s.clone()),
            Value::Object(_) => InsertContent::Embed(v.clone()),
            other => {
                return Err(OpError::InvalidOpValue(
                    "@txt".to_string(),
                    format!("insert must be a string or an embed object, found {other}"),
                ))
            }
        };
        return Ok(TextOp::Insert(content, attrs));
    }
    if let Some(v) = obj.get("retain") {
        let n = v.as_u64().ok_or_else(|| {
            OpError::InvalidOpValue("@txt".to_string(), "retain must be a non-negative integer".to_string())
        })?;
        return Ok(TextOp::Retain(n as usize, attrs));
    }
    if let Some(v) = obj.get("delete") {
        let n = v.as_u64().ok_or_else(|| {
            OpError::InvalidOpValue("@txt".to_string(), "delete must be a non-negative integer".to_string())
        })?;
        return Ok(TextOp::Delete(n as usize));
    }
    Err(OpError::InvalidOpValue(
        "@txt".to_string(),
        "delta op must have insert, retain, or delete".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(s: &str) -> TextOp {
        TextOp::Insert(InsertContent::Text(s.to_string()), None)
    }
    fn ret(n: usize) -> TextOp {
        TextOp::Retain(n, None)
    }
    fn del(n: usize) -> TextOp {
        TextOp::Delete(n)
    }

    #[test]
    fn apply_is_compose_of_doc_and_delta() {
        let doc = vec![ins("Hello world")];
        let delta = vec![ret(6), ins("there "), del(0)];
        let result = compose(&doc, &delta);
        assert_eq!(result, vec![ins("Hello there world")]);
    }

    #[test]
    fn compose_merges_insert_then_delete_away() {
        let a = vec![ins("abc")];
        let b = vec![del(3)];
        let result = compose(&a, &b);
        assert!(result.is_empty());
    }

    #[test]
    fn transform_keeps_concurrent_inserts_without_clobbering() {
        // Two concurrent inserts at the same retain position. With
        // `a_wins_ties = false`, ties go to `b`: its insert is placed before
        // the position `a`'s insert now occupies in the post-`a` document
        // (the trailing retain spanning over `a`'s insert is then elided, as
        // a trailing plain retain never changes the result of applying the
        // delta).
        let a = vec![ret(5), ins("A")];
        let b = vec![ret(5), ins("B")];
        let a_then_b = transform(&a, &b, false);
        assert_eq!(a_then_b, vec![ret(5), ins("B")]);

        let post_a = compose(&vec![ins("01234rest")], &a);
        let final_doc = compose(&post_a, &a_then_b);
        assert_eq!(final_doc, vec![ins("01234BArest")]);
    }

    #[test]
    fn invert_reconstructs_prior_document() {
        let doc = vec![ins("Hello world")];
        let delta = vec![ret(6), ins("there "), del(0)];
        let new_doc = compose(&doc, &delta);
        let inverse = invert(&doc, doc_len(&new_doc));
        let restored = compose(&new_doc, &inverse);
        assert_eq!(restored, doc);
    }

    #[test]
    fn wire_roundtrip() {
        let delta = vec![ret(2), ins("x"), del(1)];
        let value = to_value(&delta);
        let back = from_value(&value).unwrap();
        assert_eq!(back, delta);
    }

    #[test]
    fn insert_rejects_raw_primitives() {
        for primitive in [serde_json::json!(1), serde_json::json!(true), serde_json::Value::Null] {
            let value = serde_json::json!([{ "insert": primitive }]);
            assert!(from_value(&value).is_err());
        }
    }
}
