//! Recursive-descent validation of a value tree against a schema tree.
//!
//! Produces an ordered list of `{path, message}` errors; nothing aborts the
//! walk, so one bad field never hides its siblings. Every node is gated by
//! its depends-on rules against the full values snapshot — an inactive node
//! contributes no errors even when required.
//!
//! Union matching is speculative: each variant is validated into its own
//! fresh error list and the first clean one wins, so a rejected variant
//! leaves no trace in the committed errors.

pub mod leaf;

use std::fmt;

use serde_json::Value;

use crate::path::{Path, Segment};
use crate::schema::{ArraySchema, ObjectSchema, RecordSchema, SchemaNode, UnionSchema};
use crate::visibility::evaluate_depends_on;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: Path,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn at(path: &Path, message: impl Into<String>) -> ValidationError {
        ValidationError {
            path: path.clone(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "value {}", self.message)
        } else {
            write!(f, "{} {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY
// ————————————————————————————————————————————————————————————————————————————

/// Validate `values` against `schema`. The error list is complete,
/// deterministic and in schema declaration order.
pub fn validate_form(values: &Value, schema: &SchemaNode) -> ValidationReport {
    let mut errors = Vec::new();
    let mut path = Path::root();
    validate_node(schema, Some(values), &mut path, values, &mut errors);
    ValidationReport { errors }
}

// ————————————————————————————————————————————————————————————————————————————
// DESCENT
// ————————————————————————————————————————————————————————————————————————————

fn validate_node(
    schema: &SchemaNode,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    if !evaluate_depends_on(schema.depends_on(), root, path) {
        return;
    }
    validate_kind(schema, value, path, root, errors);
}

/// Kind dispatch without the visibility gate; union attempts enter here so
/// a never-matching variant condition cannot vacuously satisfy the union.
fn validate_kind(
    schema: &SchemaNode,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    match schema {
        SchemaNode::String(s) => leaf::validate_string(s, value, path, errors),
        SchemaNode::Number(s) => leaf::validate_number(s, value, path, errors),
        SchemaNode::Boolean(s) => leaf::validate_boolean(s, value, path, errors),
        SchemaNode::Date(s) => leaf::validate_date(s, value, path, errors),
        SchemaNode::Enum(s) => leaf::validate_enum(s, value, path, errors),
        SchemaNode::Json(s) => leaf::validate_json(s, value, path, errors),
        SchemaNode::Any(s) | SchemaNode::Unknown(s) => leaf::validate_any(s, value, path, errors),
        SchemaNode::Object(s) => validate_object(s, value, path, root, errors),
        SchemaNode::Array(s) => validate_array(s, value, path, root, errors),
        SchemaNode::Record(s) => validate_record(s, value, path, root, errors),
        SchemaNode::Union(s) => validate_union(s, value, path, root, errors),
    }
}

/// Nested properties are checked whenever the value is a proper map,
/// regardless of the object's own required flag; an absent optional object
/// passes silently, nested requireds included.
fn validate_object(
    schema: &ObjectSchema,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    match value.and_then(Value::as_object) {
        Some(map) => {
            if let Some(min) = schema.min_length {
                if map.len() < min {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at least {min} properties"),
                    ));
                }
            }
            if let Some(max) = schema.max_length {
                if map.len() > max {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at most {max} properties"),
                    ));
                }
            }
            for (name, prop) in &schema.properties {
                path.push(Segment::Name(name.clone()));
                validate_node(prop, map.get(name), path, root, errors);
                path.pop();
            }
        }
        None => {
            if schema.required {
                errors.push(ValidationError::at(path, "is required"));
            }
        }
    }
}

fn validate_array(
    schema: &ArraySchema,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    match value.and_then(Value::as_array) {
        Some(items) => {
            if let Some(min) = schema.min_length {
                if items.len() < min {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at least {min} items"),
                    ));
                }
            }
            if let Some(max) = schema.max_length {
                if items.len() > max {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at most {max} items"),
                    ));
                }
            }
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                validate_node(&schema.item, Some(item), path, root, errors);
                path.pop();
            }
        }
        None => {
            if schema.required {
                errors.push(ValidationError::at(path, "is required"));
            }
        }
    }
}

/// Entry counts and values only; key shape is an authoring-time concern and
/// is deliberately not re-checked here.
fn validate_record(
    schema: &RecordSchema,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    match value.and_then(Value::as_object) {
        Some(map) => {
            if let Some(min) = schema.min_length {
                if map.len() < min {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at least {min} entries"),
                    ));
                }
            }
            if let Some(max) = schema.max_length {
                if map.len() > max {
                    errors.push(ValidationError::at(
                        path,
                        format!("must have at most {max} entries"),
                    ));
                }
            }
            for (key, entry) in map {
                path.push(Segment::Name(key.clone()));
                validate_node(&schema.value_schema, Some(entry), path, root, errors);
                path.pop();
            }
        }
        None => {
            if schema.required {
                errors.push(ValidationError::at(path, "is required"));
            }
        }
    }
}

fn validate_union(
    schema: &UnionSchema,
    value: Option<&Value>,
    path: &mut Path,
    root: &Value,
    errors: &mut Vec<ValidationError>,
) {
    if schema.variants.is_empty() {
        if schema.required {
            errors.push(ValidationError::at(path, "is required"));
        }
        return;
    }
    for (index, variant) in schema.variants.iter().enumerate() {
        let mut attempt = Vec::new();
        validate_kind(variant, value, path, root, &mut attempt);
        if attempt.is_empty() {
            log::debug!("union at {path} matched variant {index}");
            return;
        }
        // rejected attempts are discarded wholesale
    }
    if schema.required {
        errors.push(ValidationError::at(
            path,
            "must match one of the union types",
        ));
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        AnySchema, ArraySchema, BooleanSchema, EnumSchema, JsonSchema, NumberSchema, ObjectSchema,
        RecordSchema, StringSchema, UnionSchema,
    };
    use serde_json::json;

    fn messages(report: &ValidationReport) -> Vec<String> {
        report.errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn constraint_violations_are_non_exclusive() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "code",
                StringSchema::new().min_length(5).pattern("^[0-9]+$"),
            )
            .into();
        let report = validate_form(&json!({"code": "ab"}), &schema);
        assert_eq!(
            messages(&report),
            [
                "code must be at least 5 characters",
                "code does not match pattern ^[0-9]+$",
            ]
        );
    }

    #[test]
    fn missing_optional_leaves_pass_constraints() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("name", StringSchema::new().min_length(2))
            .property("age", NumberSchema::new().min(0.0))
            .into();
        assert!(validate_form(&json!({}), &schema).is_valid());
        assert!(validate_form(&json!({"name": null, "age": ""}), &schema).is_valid());
    }

    #[test]
    fn boolean_required_accepts_false_but_not_null() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("accept", BooleanSchema::new().required())
            .into();
        assert!(validate_form(&json!({"accept": false}), &schema).is_valid());
        assert_eq!(
            messages(&validate_form(&json!({"accept": null}), &schema)),
            ["accept is required"]
        );
        assert_eq!(
            messages(&validate_form(&json!({}), &schema)),
            ["accept is required"]
        );
        assert_eq!(
            messages(&validate_form(&json!({"accept": "yes"}), &schema)),
            ["accept must be a boolean"]
        );
    }

    #[test]
    fn absent_optional_object_skips_nested_requireds() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "contact",
                ObjectSchema::new().property("email", StringSchema::new().required()),
            )
            .into();
        assert!(validate_form(&json!({}), &schema).is_valid());
        // a present map is recursed into even though the object is optional
        assert_eq!(
            messages(&validate_form(&json!({"contact": {}}), &schema)),
            ["contact.email is required"]
        );
    }

    #[test]
    fn array_items_validate_against_the_single_item_schema() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "ports",
                ArraySchema::new(NumberSchema::new().min(1.0).max(65535.0)).max_length(2),
            )
            .into();
        let report = validate_form(&json!({"ports": [0, 80, 99999]}), &schema);
        assert_eq!(
            messages(&report),
            [
                "ports must have at most 2 items",
                "ports.0 must be at least 1",
                "ports.2 must be at most 65535",
            ]
        );
    }

    #[test]
    fn record_checks_entry_count_and_values_not_keys() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "env",
                RecordSchema::new(StringSchema::new().min_length(10), NumberSchema::new())
                    .min_length(2),
            )
            .into();
        let report = validate_form(&json!({"env": {"short": 1}}), &schema);
        // entry count flagged; the 5-char key is not
        assert_eq!(messages(&report), ["env must have at least 2 entries"]);
        let report = validate_form(&json!({"env": {"a": 1, "b": "x"}}), &schema);
        assert_eq!(messages(&report), ["env.b must be a number"]);
    }

    #[test]
    fn union_first_clean_variant_wins_and_leaks_nothing() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "target",
                UnionSchema::new()
                    .variant(
                        ObjectSchema::new()
                            .property("host", StringSchema::new().required())
                            .property("port", NumberSchema::new().required()),
                    )
                    .variant(ObjectSchema::new().property("socket", StringSchema::new().required()))
                    .required(),
            )
            .into();

        assert!(validate_form(&json!({"target": {"socket": "/tmp/x"}}), &schema).is_valid());
        assert!(
            validate_form(&json!({"target": {"host": "db", "port": 5432}}), &schema).is_valid()
        );

        // no variant matches: exactly one error, none from rejected attempts
        let report = validate_form(&json!({"target": {"host": "db"}}), &schema);
        assert_eq!(
            messages(&report),
            ["target must match one of the union types"]
        );
    }

    #[test]
    fn optional_union_with_no_match_stays_silent() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "target",
                UnionSchema::new()
                    .variant(ObjectSchema::new().property("socket", StringSchema::new().required())),
            )
            .into();
        assert!(validate_form(&json!({}), &schema).is_valid());
        assert!(validate_form(&json!({"target": {"bogus": 1}}), &schema).is_valid());
    }

    #[test]
    fn inactive_nodes_produce_no_errors_even_when_required() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("mode", EnumSchema::new(["a", "b"]))
            .property(
                "detail",
                StringSchema::new().required().when("mode", "/a/"),
            )
            .into();
        assert!(validate_form(&json!({"mode": "b"}), &schema).is_valid());
        assert_eq!(
            messages(&validate_form(&json!({"mode": "a"}), &schema)),
            ["detail is required"]
        );
    }

    #[test]
    fn depends_on_follows_repetition_instances() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "items",
                ArraySchema::new(
                    ObjectSchema::new()
                        .property("kind", EnumSchema::new(["plain", "fancy"]))
                        .property(
                            "flourish",
                            StringSchema::new().required().when("items.kind", "/fancy/"),
                        ),
                ),
            )
            .into();
        let values = json!({"items": [
            {"kind": "plain"},
            {"kind": "fancy"},
        ]});
        // only the fancy row's flourish is demanded
        assert_eq!(
            messages(&validate_form(&values, &schema)),
            ["items.1.flourish is required"]
        );
    }

    #[test]
    fn json_payloads_must_parse() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("payload", JsonSchema::new())
            .into();
        assert!(validate_form(&json!({"payload": "{\"ok\": true}"}), &schema).is_valid());
        assert!(validate_form(&json!({"payload": {"already": "structured"}}), &schema).is_valid());
        assert_eq!(
            messages(&validate_form(&json!({"payload": "{nope"}), &schema)),
            ["payload must be valid JSON"]
        );
    }

    #[test]
    fn any_accepts_null_but_required_rejects_absent() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("extra", AnySchema::new().required())
            .into();
        assert!(validate_form(&json!({"extra": null}), &schema).is_valid());
        assert_eq!(
            messages(&validate_form(&json!({}), &schema)),
            ["extra is required"]
        );
    }

    #[test]
    fn error_order_follows_declaration_order() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("first", StringSchema::new().required())
            .property("second", NumberSchema::new().required())
            .property("third", BooleanSchema::new().required())
            .into();
        let report = validate_form(&json!({}), &schema);
        assert_eq!(
            messages(&report),
            [
                "first is required",
                "second is required",
                "third is required",
            ]
        );
    }
}
