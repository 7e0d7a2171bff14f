//! Compact array wire form: `[opcode, path, ...args]`.
//!
//! `path` is always encoded as a path-component array (numeric tokens as
//! JSON numbers) but decodes equally from a JSON Pointer string, mirroring
//! the teacher's `decode_path_from_value` dual-accept behavior.

use super::{decode_path, encode_path};
use crate::error::CodecError;
use crate::patch::{CustomOp, Op};
use crate::registry::is_builtin_opcode;
use crate::text;
use serde_json::{json, Value};

pub fn encode(ops: &[Op]) -> Value {
    Value::Array(ops.iter().map(encode_op).collect())
}

fn encode_op(op: &Op) -> Value {
    match op {
        Op::Add { path, value, soft } => {
            if *soft {
                json!(["+", encode_path(path), value, Value::Null, true])
            } else {
                json!(["+", encode_path(path), value])
            }
        }
        Op::Remove { path } => json!(["-", encode_path(path)]),
        Op::Replace { path, value } => json!(["=", encode_path(path), value]),
        Op::Move { path, from } => json!([">", encode_path(path), encode_path(from)]),
        Op::Copy { path, from } => json!(["&", encode_path(path), encode_path(from)]),
        Op::Test { path, value } => json!(["?", encode_path(path), value]),
        Op::Increment { path, delta } => json!(["^", encode_path(path), delta]),
        Op::Bit { path, mask } => json!(["~", encode_path(path), mask]),
        Op::Min { path, value } => json!(["min", encode_path(path), value]),
        Op::Max { path, value } => json!(["max", encode_path(path), value]),
        Op::Text { path, delta } => json!(["@txt", encode_path(path), text::to_value(delta)]),
        Op::Custom(c) => encode_custom(c),
    }
}

fn encode_custom(c: &CustomOp) -> Value {
    let value = c.value.clone().unwrap_or(Value::Null);
    let from = c.from.as_deref().map(encode_path).unwrap_or(Value::Null);
    if c.soft {
        json!([c.opcode, encode_path(&c.path), value, from, true])
    } else if !from.is_null() {
        json!([c.opcode, encode_path(&c.path), value, from])
    } else if !value.is_null() || c.value.is_some() {
        json!([c.opcode, encode_path(&c.path), value])
    } else {
        json!([c.opcode, encode_path(&c.path)])
    }
}

pub fn decode(data: &Value) -> Result<Vec<Op>, CodecError> {
    let arr = data.as_array().ok_or(CodecError::Malformed)?;
    arr.iter().map(decode_op).collect()
}

fn get(arr: &[Value], idx: usize) -> Result<&Value, CodecError> {
    arr.get(idx).ok_or(CodecError::Malformed)
}

fn decode_op(v: &Value) -> Result<Op, CodecError> {
    let arr = v.as_array().ok_or(CodecError::Malformed)?;
    if arr.is_empty() {
        return Err(CodecError::Malformed);
    }
    let opcode = arr[0].as_str().ok_or(CodecError::Malformed)?;
    match opcode {
        "+" => {
            let path = decode_path(get(arr, 1)?)?;
            let value = get(arr, 2)?.clone();
            let soft = arr.get(4).and_then(|v| v.as_bool()).unwrap_or(false);
            Ok(Op::Add { path, value, soft })
        }
        "-" => Ok(Op::Remove { path: decode_path(get(arr, 1)?)? }),
        "=" => Ok(Op::Replace { path: decode_path(get(arr, 1)?)?, value: get(arr, 2)?.clone() }),
        ">" => Ok(Op::Move { path: decode_path(get(arr, 1)?)?, from: decode_path(get(arr, 2)?)? }),
        "&" => Ok(Op::Copy { path: decode_path(get(arr, 1)?)?, from: decode_path(get(arr, 2)?)? }),
        "?" => Ok(Op::Test { path: decode_path(get(arr, 1)?)?, value: get(arr, 2)?.clone() }),
        "^" => {
            let delta = get(arr, 2)?.as_f64().ok_or(CodecError::Malformed)?;
            Ok(Op::Increment { path: decode_path(get(arr, 1)?)?, delta })
        }
        "~" => {
            let mask = get(arr, 2)?.as_u64().ok_or(CodecError::Malformed)? as u32;
            Ok(Op::Bit { path: decode_path(get(arr, 1)?)?, mask })
        }
        "min" => Ok(Op::Min { path: decode_path(get(arr, 1)?)?, value: get(arr, 2)?.clone() }),
        "max" => Ok(Op::Max { path: decode_path(get(arr, 1)?)?, value: get(arr, 2)?.clone() }),
        "@txt" => {
            let delta = text::from_value(get(arr, 2)?)
                .map_err(|_| CodecError::Malformed)?;
            Ok(Op::Text { path: decode_path(get(arr, 1)?)?, delta })
        }
        custom if !is_builtin_opcode(custom) => {
            let path = decode_path(get(arr, 1)?)?;
            let value = arr.get(2).filter(|v| !v.is_null()).cloned();
            let from = match arr.get(3) {
                Some(v) if !v.is_null() => Some(decode_path(v)?),
                _ => None,
            };
            let soft = arr.get(4).and_then(|v| v.as_bool()).unwrap_or(false);
            Ok(Op::Custom(CustomOp { opcode: custom.to_string(), path, value, from, soft }))
        }
        _ => Err(CodecError::UnknownOpcode),
    }
}
