// Schema derivation and request validation.
//
// Each handler declares its parameters as `InputParam`s; this module turns
// that declaration into (a) a JSON-schema-ish document for the `/docs` route
// and (b) a validator that checks an incoming request body against it,
// filling in defaults and rejecting anything the handler didn't ask for.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{InputParam, ParamKind};

/// One field that failed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A request body failed schema validation. Carries every offending field so
/// the HTTP layer can render the whole set at once (HTTP 422), rather than
/// making the client fix one field at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationError {}

/// Render an `InputParam` list as a small JSON-schema-ish object, used by the
/// `/docs` route to describe each action without hand-maintaining docs
/// alongside the Rust code.
pub fn render_schema(params: &[InputParam]) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut field = serde_json::Map::new();
        field.insert("type".to_string(), serde_json::json!(param.kind.as_str()));
        if let Some(default) = &param.default {
            field.insert("default".to_string(), default.clone());
        }
        properties.insert(param.name.clone(), serde_json::Value::Object(field));

        if param.is_required() {
            required.push(param.name.clone());
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Validate and normalize a request body against a handler's declared
/// parameters.
///
/// - Every declared field with no default must be present.
/// - Fields the handler didn't declare are rejected outright — this is what
///   lets a typo in a client's request surface as a 422 instead of being
///   silently ignored.
/// - Declared-but-absent fields with a default are filled in.
/// - Values are coerced where JSON's number type would otherwise reject a
///   plainly-correct call (e.g. `5` parsed for a `Float` parameter).
///
/// Returns the normalized body as a JSON object on success.
pub fn validate(params: &[InputParam], body: &serde_json::Value) -> Result<serde_json::Value, ValidationError> {
    let body_obj = match body {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        _ => {
            return Err(ValidationError {
                errors: vec![FieldError::new("body", "expected a JSON object")],
            })
        }
    };

    let mut errors = Vec::new();
    let mut normalized = serde_json::Map::new();
    let declared: std::collections::HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();

    for (key, _) in &body_obj {
        if !declared.contains(key.as_str()) {
            errors.push(FieldError::new(key, "unexpected field"));
        }
    }

    for param in params {
        match body_obj.get(&param.name) {
            Some(value) => match coerce(value, param.kind) {
                Ok(coerced) => {
                    normalized.insert(param.name.clone(), coerced);
                }
                Err(message) => errors.push(FieldError::new(&param.name, message)),
            },
            None => {
                if let Some(default) = &param.default {
                    normalized.insert(param.name.clone(), default.clone());
                } else {
                    errors.push(FieldError::new(&param.name, "field required"));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(serde_json::Value::Object(normalized))
    } else {
        Err(ValidationError { errors })
    }
}

fn coerce(value: &serde_json::Value, kind: ParamKind) -> Result<serde_json::Value, String> {
    match kind {
        ParamKind::Any => Ok(value.clone()),
        ParamKind::String => match value {
            serde_json::Value::String(_) => Ok(value.clone()),
            _ => Err("expected a string".to_string()),
        },
        ParamKind::Boolean => match value {
            serde_json::Value::Bool(_) => Ok(value.clone()),
            _ => Err("expected a boolean".to_string()),
        },
        ParamKind::Integer => match value {
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            _ => Err("expected an integer".to_string()),
        },
        ParamKind::Float => match value {
            serde_json::Value::Number(n) => Ok(serde_json::json!(n.as_f64().unwrap_or_default())),
            _ => Err("expected a number".to_string()),
        },
        ParamKind::Object => match value {
            serde_json::Value::Object(_) => Ok(value.clone()),
            _ => Err("expected an object".to_string()),
        },
        ParamKind::Array => match value {
            serde_json::Value::Array(_) => Ok(value.clone()),
            _ => Err("expected an array".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<InputParam> {
        vec![
            InputParam::required("x", ParamKind::Integer),
            InputParam::with_default("y", ParamKind::Integer, serde_json::json!(5)),
            InputParam::with_default("z", ParamKind::Integer, serde_json::json!(10)),
        ]
    }

    #[test]
    fn fills_in_defaults() {
        let body = serde_json::json!({ "x": 1 });
        let result = validate(&params(), &body).unwrap();
        assert_eq!(result["x"], serde_json::json!(1));
        assert_eq!(result["y"], serde_json::json!(5));
        assert_eq!(result["z"], serde_json::json!(10));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let body = serde_json::json!({ "y": 2 });
        let err = validate(&params(), &body).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "x");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let body = serde_json::json!({ "x": 1, "bogus": true });
        let err = validate(&params(), &body).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "bogus"));
    }

    #[test]
    fn float_coerces_integral_json_numbers() {
        let params = vec![InputParam::required("f", ParamKind::Float)];
        let body = serde_json::json!({ "f": 3 });
        let result = validate(&params, &body).unwrap();
        assert_eq!(result["f"], serde_json::json!(3.0));
    }
}
