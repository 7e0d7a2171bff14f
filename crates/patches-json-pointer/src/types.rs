//! Type definitions for JSON Pointer.

use serde_json::Value;

/// A step in a JSON Pointer path.
///
/// Can be either a string (object key) or number (array index).
pub type PathStep = String;

/// A JSON Pointer path.
pub type Path = Vec<PathStep>;

/// The key used to reach a [`Reference`]'s value from its container.
///
/// An array container yields a numeric index; an object container yields a
/// string key. Kept as a closed enum (rather than re-stringifying the index)
/// so callers can match on the container kind without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKey {
    Index(usize),
    String(String),
}

/// A reference to a value in a JSON document.
///
/// Contains the target value, the object that contains it, and the key used
/// to access it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// The target value. `None` if the value doesn't exist or is null.
    pub val: Option<Value>,
    /// The object or array containing the target value.
    pub obj: Option<Value>,
    /// The key (string for objects, index for arrays) used to access the value.
    pub key: Option<ReferenceKey>,
}

impl Reference {
    /// Check if this reference points to an array element.
    pub fn is_array_reference(&self) -> bool {
        matches!(&self.obj, Some(Value::Array(_)))
    }

    /// Check if this reference points to an object property.
    pub fn is_object_reference(&self) -> bool {
        matches!(&self.obj, Some(Value::Object(_)))
    }

    /// Check if this reference points to the end of an array.
    ///
    /// Returns true if the key is equal to the array length.
    pub fn is_array_end(&self) -> bool {
        if let (Some(Value::Array(arr)), Some(ReferenceKey::Index(idx))) = (&self.obj, &self.key)
        {
            return *idx == arr.len();
        }
        false
    }

    /// Get the array containing the referenced value.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match &self.obj {
            Some(Value::Array(arr)) => Some(arr),
            _ => None,
        }
    }

    /// Get the object containing the referenced value.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match &self.obj {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Get the numeric index if this is an array reference.
    pub fn index(&self) -> Option<usize> {
        match &self.key {
            Some(ReferenceKey::Index(idx)) => Some(*idx),
            _ => None,
        }
    }
}
