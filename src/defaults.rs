//! Default derivation: an initial value tree computed from a schema tree.
//!
//! Objects are walked in declared property order with a growing sibling
//! context, so a discriminator declared before its dependents decides which
//! of them exist at all. An inactive property is omitted outright — the
//! per-field outcome is `Option<Value>`, never a sentinel null — which is
//! what keeps hidden keys out of the derived map.

use serde_json::{Map, Value};

use crate::path::{Path, Segment};
use crate::schema::SchemaNode;
use crate::visibility::evaluate_depends_on;

/// Derive the initial value for a schema tree.
///
/// Arrays and records default to empty containers (items materialize when
/// the user adds one); leaves use their declared default or null; unions
/// default to null. A root that is itself inactive yields null.
pub fn derive_defaults(schema: &SchemaNode) -> Value {
    derive(schema, &Value::Object(Map::new()), &Path::root()).unwrap_or(Value::Null)
}

/// `None` means the node is inactive and its key must not exist.
///
/// Each object scope is self-contained: a property's rules are evaluated
/// against the partially built sibling map, addressed by bare name.
fn derive(schema: &SchemaNode, context: &Value, at: &Path) -> Option<Value> {
    if !evaluate_depends_on(schema.depends_on(), context, at) {
        return None;
    }
    Some(match schema {
        SchemaNode::Object(obj) => {
            let mut out = Value::Object(Map::new());
            for (name, prop) in &obj.properties {
                let prop_at = Path::from_segments(vec![Segment::Name(name.clone())]);
                if let Some(derived) = derive(prop, &out, &prop_at) {
                    if let Value::Object(map) = &mut out {
                        map.insert(name.clone(), derived);
                    }
                }
            }
            out
        }
        SchemaNode::Array(_) => Value::Array(Vec::new()),
        SchemaNode::Record(_) => Value::Object(Map::new()),
        SchemaNode::Union(_) => Value::Null,
        SchemaNode::String(_)
        | SchemaNode::Number(_)
        | SchemaNode::Boolean(_)
        | SchemaNode::Date(_)
        | SchemaNode::Enum(_)
        | SchemaNode::Json(_)
        | SchemaNode::Any(_)
        | SchemaNode::Unknown(_) => schema.declared_default().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        ArraySchema, BooleanSchema, EnumSchema, NumberSchema, ObjectSchema, RecordSchema,
        StringSchema, UnionSchema,
    };
    use serde_json::json;

    #[test]
    fn leaves_use_declared_defaults_or_null() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("name", StringSchema::new().default_value("anon"))
            .property("age", NumberSchema::new())
            .property("active", BooleanSchema::new().default_value(true))
            .into();
        assert_eq!(
            derive_defaults(&schema),
            json!({"name": "anon", "age": null, "active": true})
        );
    }

    #[test]
    fn containers_default_to_empty_and_unions_to_null() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("tags", ArraySchema::new(StringSchema::new()))
            .property(
                "env",
                RecordSchema::new(StringSchema::new(), StringSchema::new()),
            )
            .property(
                "target",
                UnionSchema::new().variant(ObjectSchema::new().property("host", StringSchema::new())),
            )
            .into();
        assert_eq!(
            derive_defaults(&schema),
            json!({"tags": [], "env": {}, "target": null})
        );
    }

    #[test]
    fn inactive_properties_are_omitted_not_nulled() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("option", EnumSchema::new(["A", "B", "C"]).default_value("A"))
            .property("a", StringSchema::new().default_value("only for A").when("option", "/A/"))
            .property("b", NumberSchema::new().default_value(5.0).when("option", "/B/"))
            .into();
        let derived = derive_defaults(&schema);
        assert_eq!(derived, json!({"option": "A", "a": "only for A"}));
        // the key must not exist at all
        assert!(derived.get("b").is_none());
    }

    #[test]
    fn sibling_order_is_load_bearing() {
        // the dependent is declared before its discriminator: at evaluation
        // time the sibling context has no "option" yet, so it is hidden
        let schema: SchemaNode = ObjectSchema::new()
            .property("a", StringSchema::new().default_value("x").when("option", "/A/"))
            .property("option", EnumSchema::new(["A", "B"]).default_value("A"))
            .into();
        assert_eq!(derive_defaults(&schema), json!({"option": "A"}));
    }

    #[test]
    fn nested_objects_get_their_own_sibling_scope() {
        let schema: SchemaNode = ObjectSchema::new()
            .property(
                "inner",
                ObjectSchema::new()
                    .property("kind", EnumSchema::new(["x", "y"]).default_value("y"))
                    .property("why", StringSchema::new().default_value("!").when("kind", "/y/")),
            )
            .into();
        assert_eq!(
            derive_defaults(&schema),
            json!({"inner": {"kind": "y", "why": "!"}})
        );
    }

    #[test]
    fn derivation_is_idempotent() {
        let schema: SchemaNode = ObjectSchema::new()
            .property("option", EnumSchema::new(["A", "B"]).default_value("B"))
            .property("b", NumberSchema::new().default_value(1.0).when("option", "/B/"))
            .property("tags", ArraySchema::new(StringSchema::new()))
            .into();
        assert_eq!(derive_defaults(&schema), derive_defaults(&schema));
    }

    #[test]
    fn inactive_root_yields_null() {
        let schema: SchemaNode = StringSchema::new()
            .default_value("hidden")
            .when("never", "/x/")
            .into();
        assert_eq!(derive_defaults(&schema), json!(null));
    }
}
