//! The descriptor: a plain, transport-neutral rendering of a schema tree.
//!
//! This is the only form exchanged with external consumers (renderers,
//! storage, whatever loads schema JSON). Conversion is lossless both ways:
//! feeding a descriptor back through the default deriver or the validator
//! behaves exactly like the builder tree it came from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{
    AnySchema, ArraySchema, BooleanSchema, ConstraintPattern, DateSchema, EnumSchema, JsonSchema,
    NumberSchema, ObjectSchema, RecordSchema, SchemaNode, StringSchema, UnionSchema,
    format_datetime, parse_datetime,
};
use crate::visibility::DependsOn;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One visibility rule in descriptor form: a dotted field path and the
/// condition's source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependsOnDescriptor {
    pub field: String,
    pub condition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<f64>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<bool>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

/// Date bounds and defaults travel as text; the schema parses them on decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    pub items: Box<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default)]
    pub properties: IndexMap<String, Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    pub key_schema: Box<Descriptor>,
    pub value_schema: Box<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionDescriptor {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(rename = "anyOf", default)]
    pub any_of: Vec<Descriptor>,
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOnDescriptor>,
}

/// The serializable schema tree, discriminated by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Descriptor {
    String(StringDescriptor),
    Number(NumberDescriptor),
    Boolean(BooleanDescriptor),
    Date(DateDescriptor),
    Enum(EnumDescriptor),
    Json(JsonDescriptor),
    Any(AnyDescriptor),
    Unknown(AnyDescriptor),
    Array(ArrayDescriptor),
    Object(ObjectDescriptor),
    Record(RecordDescriptor),
    Union(UnionDescriptor),
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ————————————————————————————————————————————————————————————————————————————
// JSON I/O
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid descriptor at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Descriptor {
    /// Parse descriptor JSON with path context in decode errors.
    pub fn from_json_str(src: &str) -> Result<Descriptor, DescriptorError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        serde_path_to_error::deserialize(de).map_err(|err| {
            let path = err.path().to_string();
            DescriptorError::Decode {
                path,
                source: err.into_inner(),
            }
        })
    }

    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA ⇄ DESCRIPTOR
// ————————————————————————————————————————————————————————————————————————————

fn rules_to_descriptor(rules: &[DependsOn]) -> Vec<DependsOnDescriptor> {
    rules
        .iter()
        .map(|r| DependsOnDescriptor {
            field: r.field.to_string(),
            condition: r.condition.source().to_string(),
        })
        .collect()
}

fn rules_from_descriptor(rules: &[DependsOnDescriptor]) -> Vec<DependsOn> {
    rules
        .iter()
        .map(|r| DependsOn::new(&r.field, &r.condition))
        .collect()
}

fn parse_date_field(text: Option<&String>, what: &str) -> Option<chrono::NaiveDateTime> {
    let text = text?;
    let parsed = parse_datetime(text);
    if parsed.is_none() {
        log::warn!("date {what} {text:?} did not parse and will not be enforced");
    }
    parsed
}

impl SchemaNode {
    pub fn to_descriptor(&self) -> Descriptor {
        match self {
            SchemaNode::String(s) => Descriptor::String(StringDescriptor {
                required: s.required,
                default_value: s.default_value.clone(),
                min_length: s.min_length,
                max_length: s.max_length,
                pattern: s.pattern.as_ref().map(|p| p.source().to_string()),
                options: s.options.clone(),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Number(s) => Descriptor::Number(NumberDescriptor {
                required: s.required,
                default_value: s.default_value,
                min: s.min,
                max: s.max,
                options: s.options.clone(),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Boolean(s) => Descriptor::Boolean(BooleanDescriptor {
                required: s.required,
                default_value: s.default_value,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Date(s) => Descriptor::Date(DateDescriptor {
                required: s.required,
                default_value: s.default_value.as_ref().map(format_datetime),
                min: s.min.as_ref().map(format_datetime),
                max: s.max.as_ref().map(format_datetime),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Enum(s) => Descriptor::Enum(EnumDescriptor {
                required: s.required,
                default_value: s.default_value.clone(),
                values: s.values.clone(),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Json(s) => Descriptor::Json(JsonDescriptor {
                required: s.required,
                default_value: s.default_value.clone(),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Any(s) => Descriptor::Any(AnyDescriptor {
                required: s.required,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Unknown(s) => Descriptor::Unknown(AnyDescriptor {
                required: s.required,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Array(s) => Descriptor::Array(ArrayDescriptor {
                required: s.required,
                items: Box::new(s.item.to_descriptor()),
                min_length: s.min_length,
                max_length: s.max_length,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Object(s) => Descriptor::Object(ObjectDescriptor {
                required: s.required,
                properties: s
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_descriptor()))
                    .collect(),
                min_length: s.min_length,
                max_length: s.max_length,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Record(s) => Descriptor::Record(RecordDescriptor {
                required: s.required,
                key_schema: Box::new(s.key_schema.to_descriptor()),
                value_schema: Box::new(s.value_schema.to_descriptor()),
                min_length: s.min_length,
                max_length: s.max_length,
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
            SchemaNode::Union(s) => Descriptor::Union(UnionDescriptor {
                required: s.required,
                any_of: s.variants.iter().map(|v| v.to_descriptor()).collect(),
                depends_on: rules_to_descriptor(&s.depends_on),
            }),
        }
    }

    /// Total: pattern and date text that fails to compile/parse degrades the
    /// same way it does in the builder (sentinel conditions, dropped
    /// constraints), never an error.
    pub fn from_descriptor(descriptor: &Descriptor) -> SchemaNode {
        match descriptor {
            Descriptor::String(d) => SchemaNode::String(StringSchema {
                required: d.required,
                default_value: d.default_value.clone(),
                min_length: d.min_length,
                max_length: d.max_length,
                pattern: d.pattern.as_deref().map(ConstraintPattern::compile),
                options: d.options.clone(),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Number(d) => SchemaNode::Number(NumberSchema {
                required: d.required,
                default_value: d.default_value,
                min: d.min,
                max: d.max,
                options: d.options.clone(),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Boolean(d) => SchemaNode::Boolean(BooleanSchema {
                required: d.required,
                default_value: d.default_value,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Date(d) => SchemaNode::Date(DateSchema {
                required: d.required,
                default_value: parse_date_field(d.default_value.as_ref(), "default"),
                min: parse_date_field(d.min.as_ref(), "min"),
                max: parse_date_field(d.max.as_ref(), "max"),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Enum(d) => SchemaNode::Enum(EnumSchema {
                required: d.required,
                default_value: d.default_value.clone(),
                values: d.values.clone(),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Json(d) => SchemaNode::Json(JsonSchema {
                required: d.required,
                default_value: d.default_value.clone(),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Any(d) => SchemaNode::Any(AnySchema {
                required: d.required,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Unknown(d) => SchemaNode::Unknown(AnySchema {
                required: d.required,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Array(d) => SchemaNode::Array(ArraySchema {
                required: d.required,
                item: Box::new(SchemaNode::from_descriptor(&d.items)),
                min_length: d.min_length,
                max_length: d.max_length,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Object(d) => SchemaNode::Object(ObjectSchema {
                required: d.required,
                properties: d
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), SchemaNode::from_descriptor(v)))
                    .collect(),
                min_length: d.min_length,
                max_length: d.max_length,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Record(d) => SchemaNode::Record(RecordSchema {
                required: d.required,
                key_schema: Box::new(SchemaNode::from_descriptor(&d.key_schema)),
                value_schema: Box::new(SchemaNode::from_descriptor(&d.value_schema)),
                min_length: d.min_length,
                max_length: d.max_length,
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
            Descriptor::Union(d) => SchemaNode::Union(UnionSchema {
                required: d.required,
                variants: d.any_of.iter().map(SchemaNode::from_descriptor).collect(),
                depends_on: rules_from_descriptor(&d.depends_on),
            }),
        }
    }
}

impl From<&SchemaNode> for Descriptor {
    fn from(schema: &SchemaNode) -> Descriptor {
        schema.to_descriptor()
    }
}

impl From<&Descriptor> for SchemaNode {
    fn from(descriptor: &Descriptor) -> SchemaNode {
        SchemaNode::from_descriptor(descriptor)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
