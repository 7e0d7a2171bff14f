//! Verbose object wire form: `{op, path, value?, from?, soft?}`.
//!
//! Grounded on the teacher's `json_patch::codec::json` module (`to_json`/
//! `from_json`), generalized from its RFC 6902 op-name set to this crate's
//! opcode strings and from path-as-JSON-Pointer-string only to the same
//! string-or-array dual accept used by the compact codec.

use super::{decode_path, encode_path};
use crate::error::CodecError;
use crate::patch::{CustomOp, Op};
use crate::registry::is_builtin_opcode;
use crate::text;
use serde_json::{Map, Value};

pub fn to_json(ops: &[Op]) -> Value {
    Value::Array(ops.iter().map(encode_op).collect())
}

fn encode_op(op: &Op) -> Value {
    let mut m = Map::new();
    match op {
        Op::Add { path, value, soft } => {
            m.insert("op".into(), "+".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), value.clone());
            if *soft {
                m.insert("soft".into(), Value::Bool(true));
            }
        }
        Op::Remove { path } => {
            m.insert("op".into(), "-".into());
            m.insert("path".into(), encode_path(path));
        }
        Op::Replace { path, value } => {
            m.insert("op".into(), "=".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), value.clone());
        }
        Op::Move { path, from } => {
            m.insert("op".into(), ">".into());
            m.insert("path".into(), encode_path(path));
            m.insert("from".into(), encode_path(from));
        }
        Op::Copy { path, from } => {
            m.insert("op".into(), "&".into());
            m.insert("path".into(), encode_path(path));
            m.insert("from".into(), encode_path(from));
        }
        Op::Test { path, value } => {
            m.insert("op".into(), "?".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), value.clone());
        }
        Op::Increment { path, delta } => {
            m.insert("op".into(), "^".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), (*delta).into());
        }
        Op::Bit { path, mask } => {
            m.insert("op".into(), "~".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), (*mask).into());
        }
        Op::Min { path, value } => {
            m.insert("op".into(), "min".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), value.clone());
        }
        Op::Max { path, value } => {
            m.insert("op".into(), "max".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), value.clone());
        }
        Op::Text { path, delta } => {
            m.insert("op".into(), "@txt".into());
            m.insert("path".into(), encode_path(path));
            m.insert("value".into(), text::to_value(delta));
        }
        Op::Custom(c) => {
            m.insert("op".into(), c.opcode.clone().into());
            m.insert("path".into(), encode_path(&c.path));
            if let Some(value) = &c.value {
                m.insert("value".into(), value.clone());
            }
            if let Some(from) = &c.from {
                m.insert("from".into(), encode_path(from));
            }
            if c.soft {
                m.insert("soft".into(), Value::Bool(true));
            }
        }
    }
    Value::Object(m)
}

pub fn from_json(data: &Value) -> Result<Vec<Op>, CodecError> {
    let arr = data.as_array().ok_or(CodecError::Malformed)?;
    arr.iter().map(decode_op).collect()
}

fn decode_op(v: &Value) -> Result<Op, CodecError> {
    let obj = v.as_object().ok_or(CodecError::Malformed)?;
    let opcode = obj.get("op").and_then(|v| v.as_str()).ok_or(CodecError::Malformed)?;
    let path = decode_path(obj.get("path").ok_or(CodecError::Malformed)?)?;
    let value = || obj.get("value").cloned().ok_or(CodecError::Malformed);
    let from = || -> Result<Vec<String>, CodecError> {
        decode_path(obj.get("from").ok_or(CodecError::Malformed)?)
    };
    let soft = obj.get("soft").and_then(|v| v.as_bool()).unwrap_or(false);

    match opcode {
        "+" => Ok(Op::Add { path, value: value()?, soft }),
        "-" => Ok(Op::Remove { path }),
        "=" => Ok(Op::Replace { path, value: value()? }),
        ">" => Ok(Op::Move { path, from: from()? }),
        "&" => Ok(Op::Copy { path, from: from()? }),
        "?" => Ok(Op::Test { path, value: value()? }),
        "^" => Ok(Op::Increment { path, delta: value()?.as_f64().ok_or(CodecError::Malformed)? }),
        "~" => Ok(Op::Bit { path, mask: value()?.as_u64().ok_or(CodecError::Malformed)? as u32 }),
        "min" => Ok(Op::Min { path, value: value()? }),
        "max" => Ok(Op::Max { path, value: value()? }),
        "@txt" => Ok(Op::Text {
            path,
            delta: text::from_value(&value()?).map_err(|_| CodecError::Malformed)?,
        }),
        custom if !is_builtin_opcode(custom) => Ok(Op::Custom(CustomOp {
            opcode: custom.to_string(),
            path,
            value: obj.get("value").cloned(),
            from: obj.get("from").map(decode_path).transpose()?,
            soft,
        })),
        _ => Err(CodecError::UnknownOpcode),
    }
}
