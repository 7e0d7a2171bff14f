use serde_json::{Map, Value};

/// Creates a deep clone of any JSON value.
///
/// This is a recursive clone that creates new instances of all
/// nested objects and arrays.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use patches_util::json_clone::clone;
///
/// let original = json!({"foo": [1, 2, 3]});
/// let cloned = clone(&original);
///
/// // The cloned value is equal to the original
/// assert_eq!(original, cloned);
/// ```
pub fn clone(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
        Value::Array(arr) => Value::Array(arr.iter().map(clone).collect()),
        Value::Object(obj) => {
            let mut new_obj = Map::new();
            for (key, val) in obj {
                new_obj.insert(key.clone(), clone(val));
            }
            Value::Object(new_obj)
        }
    }
}
