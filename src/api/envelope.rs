use serde_json::Value;

/// Shape of a success body as far as unwrapping is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body, or a JSON `null`
    Empty,
    Array(Vec<Value>),
    /// `{ "data": ... }` wrapper around the real payload
    Envelope(Value),
    PlainObject(serde_json::Map<String, Value>),
    /// Strings, numbers and booleans pass through untouched
    Scalar(Value),
}

impl Body {
    pub fn classify(body: Option<Value>) -> Self {
        match body {
            None | Some(Value::Null) => Body::Empty,
            Some(Value::Array(items)) => Body::Array(items),
            Some(Value::Object(mut map)) => match map.remove("data") {
                Some(data) => Body::Envelope(data),
                None => Body::PlainObject(map),
            },
            Some(other) => Body::Scalar(other),
        }
    }

    pub fn into_payload(self) -> Value {
        match self {
            Body::Empty => Value::Null,
            Body::Array(items) => Value::Array(items),
            Body::Envelope(data) => data,
            Body::PlainObject(map) => Value::Object(map),
            Body::Scalar(value) => value,
        }
    }
}

/// Strip the `{ data: ... }` envelope if there is one
pub fn unwrap_body(body: Option<Value>) -> Value {
    Body::classify(body).into_payload()
}

/// Parse raw response bytes. Empty bodies are `None`; anything that is not
/// JSON is kept as a string so error messages can still fall back cleanly.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
