//! Primitive-kind checks: the missing-value rule, type shape, and the
//! per-kind constraints. Constraint violations are non-exclusive — every
//! violated bound reports its own error.

use serde_json::Value;

use crate::path::Path;
use crate::schema::{
    AnySchema, BooleanSchema, DateSchema, EnumSchema, JsonSchema, NumberSchema, StringSchema,
    format_datetime, parse_datetime,
};
use crate::validate::ValidationError;

/// Absent, null and the empty string all count as "not filled in" for the
/// text-like leaves; optional leaves skip their constraints entirely then.
fn missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

pub(super) fn validate_string(
    schema: &StringSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if missing(value) {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    match value {
        Some(Value::String(text)) => {
            let len = text.chars().count();
            if let Some(min) = schema.min_length {
                if len < min {
                    errors.push(ValidationError::at(
                        path,
                        format!("must be at least {min} characters"),
                    ));
                }
            }
            if let Some(max) = schema.max_length {
                if len > max {
                    errors.push(ValidationError::at(
                        path,
                        format!("must be at most {max} characters"),
                    ));
                }
            }
            if let Some(pattern) = &schema.pattern {
                // a dropped (uncompilable) pattern is not enforced
                if pattern.matches(text) == Some(false) {
                    errors.push(ValidationError::at(
                        path,
                        format!("does not match pattern {}", pattern.source()),
                    ));
                }
            }
            if !schema.options.is_empty() && !schema.options.iter().any(|o| o == text) {
                errors.push(ValidationError::at(
                    path,
                    format!("must be one of: {}", schema.options.join(", ")),
                ));
            }
        }
        _ => errors.push(ValidationError::at(path, "must be a string")),
    }
}

pub(super) fn validate_number(
    schema: &NumberSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if missing(value) {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    match value.and_then(Value::as_f64) {
        Some(n) => {
            if let Some(min) = schema.min {
                if n < min {
                    errors.push(ValidationError::at(path, format!("must be at least {min}")));
                }
            }
            if let Some(max) = schema.max {
                if n > max {
                    errors.push(ValidationError::at(path, format!("must be at most {max}")));
                }
            }
            if !schema.options.is_empty() && !schema.options.contains(&n) {
                let listed = schema
                    .options
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                errors.push(ValidationError::at(path, format!("must be one of: {listed}")));
            }
        }
        None => errors.push(ValidationError::at(path, "must be a number")),
    }
}

/// Required means explicitly set: exactly `true` or `false`, never a
/// merely-truthy stand-in.
pub(super) fn validate_boolean(
    schema: &BooleanSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        None | Some(Value::Null) => {
            if schema.required {
                errors.push(ValidationError::at(path, "is required"));
            }
        }
        Some(Value::Bool(_)) => {}
        Some(_) => errors.push(ValidationError::at(path, "must be a boolean")),
    }
}

pub(super) fn validate_date(
    schema: &DateSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if missing(value) {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    match value.and_then(Value::as_str).and_then(parse_datetime) {
        Some(dt) => {
            if let Some(min) = schema.min {
                if dt < min {
                    errors.push(ValidationError::at(
                        path,
                        format!("must be at least {}", format_datetime(&min)),
                    ));
                }
            }
            if let Some(max) = schema.max {
                if dt > max {
                    errors.push(ValidationError::at(
                        path,
                        format!("must be at most {}", format_datetime(&max)),
                    ));
                }
            }
        }
        None => errors.push(ValidationError::at(path, "must be a valid date")),
    }
}

pub(super) fn validate_enum(
    schema: &EnumSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if missing(value) {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    let member = value
        .and_then(Value::as_str)
        .map(|text| schema.values.iter().any(|v| v == text))
        .unwrap_or(false);
    if !member {
        errors.push(ValidationError::at(
            path,
            format!("must be one of: {}", schema.values.join(", ")),
        ));
    }
}

/// Textual payloads must parse as JSON; anything already structured is
/// JSON by construction.
pub(super) fn validate_json(
    schema: &JsonSchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if missing(value) {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    if let Some(Value::String(text)) = value {
        if serde_json::from_str::<Value>(text).is_err() {
            errors.push(ValidationError::at(path, "must be valid JSON"));
        }
    }
}

/// Accepts everything; only a strictly absent value can violate required
/// (an explicit null is a legitimate "any" value).
pub(super) fn validate_any(
    schema: &AnySchema,
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<ValidationError>,
) {
    if value.is_none() && schema.required {
        errors.push(ValidationError::at(path, "is required"));
    }
}
