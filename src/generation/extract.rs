use serde_json::Value;

/// Best-effort recovery of a JSON object from model output.
///
/// The text is parsed as-is first. If that fails, the span from the first
/// `{` to the last `}` is parsed instead, which strips prose or code fences
/// around the object. `Err` carries the parser message of the last attempt.
pub fn extract_json_object(text: &str) -> Result<Value, String> {
    let direct_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            log::warn!("Model output was not bare JSON, retrying on the outermost braces");
            serde_json::from_str(&text[start..=end]).map_err(|e| e.to_string())
        }
        _ => Err(direct_err.to_string()),
    }
}
