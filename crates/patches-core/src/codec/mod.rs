//! Wire codecs for [`crate::patch::Op`]: the compact array form
//! `[opcode, path, value?, from?, soft?]` and the verbose object form
//! `{op, path, value?, from?, soft?}`.
//!
//! Grounded on the teacher's `json_patch::codec::compact`/`json` modules —
//! same opcode-dispatch-on-array-length shape, same dual accept of a JSON
//! Pointer string or a path-component array, generalized from this
//! codebase's ancestor's numeric opcode table to this crate's short string
//! opcodes (`+ - = > & ? ^ ~ @txt min max`), which are already the wire
//! form for custom opcodes too.

pub mod compact;
pub mod verbose;

use crate::error::CodecError;

pub(crate) fn decode_path(v: &serde_json::Value) -> Result<Vec<String>, CodecError> {
    match v {
        serde_json::Value::String(s) => Ok(patches_json_pointer::parse_json_pointer(s)),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.clone()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                _ => Err(CodecError::Malformed),
            })
            .collect(),
        serde_json::Value::Null => Ok(Vec::new()),
        _ => Err(CodecError::Malformed),
    }
}

pub(crate) fn encode_path(path: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        path.iter()
            .map(|token| {
                if patches_json_pointer::is_valid_index(token) {
                    serde_json::json!(token.parse::<u64>().unwrap())
                } else {
                    serde_json::json!(token)
                }
            })
            .collect(),
    )
}
