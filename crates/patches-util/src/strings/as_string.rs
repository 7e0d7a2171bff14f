/// Serialize text as a JSON string value.
///
/// This function wraps a string in double quotes and escapes special characters
/// as needed for JSON serialization.
///
/// # Examples
///
/// ```
/// use patches_util::strings::as_string;
///
/// assert_eq!(as_string("hello"), "\"hello\"");
/// assert_eq!(as_string("say \"hi\""), "\"say \\\"hi\\\"\"");
/// assert_eq!(as_string("back\\slash"), "\"back\\\\slash\"");
/// ```
pub fn as_string(s: &str) -> String {
    // String serialization cannot fail - serde_json always successfully serializes strings
    serde_json::to_string(s).expect("string serialization is infallible")
}
