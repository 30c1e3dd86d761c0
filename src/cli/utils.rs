use serde_json::{json, Map, Value};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".into(), Value::Bool(true));
            response.insert("message".into(), Value::String(message.to_string()));

            match data {
                Some(Value::Object(fields)) => response.extend(fields),
                Some(other) => {
                    response.insert("data".into(), other);
                }
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
    status: Option<u16>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            if let Some(status) = status {
                response["status"] = json!(status);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Output an API payload: wrapped under `key` for JSON, one record per line for text
pub fn output_payload(
    output_format: &OutputFormat,
    key: &str,
    payload: &Value,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ key: payload }))?);
        }
        OutputFormat::Text => match payload {
            Value::Array(items) => {
                for item in items {
                    println!("{}", summarize(item));
                }
                println!("{} {}", items.len(), key);
            }
            Value::Null => println!("(empty)"),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// One-line summary of a record for text listings
fn summarize(item: &Value) -> String {
    let Some(fields) = item.as_object() else {
        return item.to_string();
    };

    let id = ["_id", "id"]
        .iter()
        .find_map(|k| fields.get(*k))
        .map(display_scalar)
        .unwrap_or_else(|| "-".to_string());

    let label = ["name", "title", "fullName", "email", "rollNumber"]
        .iter()
        .find_map(|k| fields.get(*k))
        .map(display_scalar)
        .unwrap_or_default();

    format!("{:<26} {}", id, label)
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Turn a JSON object of filters into query pairs; strings are sent unquoted
pub fn query_pairs(filter: &str) -> anyhow::Result<Vec<(String, String)>> {
    let parsed: Value = serde_json::from_str(filter)
        .map_err(|e| anyhow::anyhow!("Invalid --filter JSON: {}", e))?;

    let Value::Object(fields) = parsed else {
        anyhow::bail!("--filter must be a JSON object");
    };

    Ok(fields
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k, display_scalar(&v)))
        .collect())
}
