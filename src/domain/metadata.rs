use serde_json::{Map, Value};

/// Opaque key-value bag carried by tasks, events, collections, and templates.
pub type Metadata = Map<String, Value>;

/// Empty bags are stored as NULL so untouched rows stay compact.
pub fn encode(metadata: &Metadata) -> Option<String> {
    if metadata.is_empty() {
        None
    } else {
        Some(Value::Object(metadata.clone()).to_string())
    }
}

pub fn decode(raw: Option<&str>) -> Result<Metadata, serde_json::Error> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Metadata::new());
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => {
            let mut wrapped = Metadata::new();
            wrapped.insert("value".to_string(), other);
            Ok(wrapped)
        }
    }
}

/// Parses a user-supplied JSON object, as passed on the command line.
pub fn parse_object(raw: &str) -> Result<Metadata, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("metadata must be a JSON object".to_string()),
        Err(err) => Err(format!("metadata is not valid JSON: {err}")),
    }
}
