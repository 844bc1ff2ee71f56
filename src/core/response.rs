use serde_json::Value;

/// What came back from the model once fences are stripped.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Json(Value),
    Text { raw: String, cleaned: String },
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_model_reply(text: &str) -> ModelReply {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => ModelReply::Json(value),
        Err(e) => {
            tracing::debug!("Model reply is not JSON ({}), keeping plain text", e);
            ModelReply::Text {
                raw: text.to_string(),
                cleaned,
            }
        }
    }
}

/// A string field only counts when it is a non-empty string.
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `None` when the field is missing or null; an explicit empty array stays empty.
pub fn string_list_field(value: &Value, key: &str) -> Option<Vec<String>> {
    match value.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) if !s.is_empty() => Some(vec![s.clone()]),
        _ => None,
    }
}

pub fn object_list_field<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter(|item| item.is_object()).collect())
        .unwrap_or_default()
}
