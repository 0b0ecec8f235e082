//! Schema model: an immutable tagged node tree with fluent builders.
//!
//! One constraint struct per node kind; [`SchemaNode`] is the sum of them,
//! matched exhaustively by the serializer, the default deriver and the
//! validator, so adding a kind is a compile error everywhere it matters.
//!
//! Patterns (both string constraints and depends-on conditions) are
//! compiled once here, at build/decode time; validation and visibility only
//! ever see the compiled form.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::defaults::derive_defaults;
use crate::visibility::DependsOn;

// ————————————————————————————————————————————————————————————————————————————
// COMPILED CONSTRAINT PATTERNS
// ————————————————————————————————————————————————————————————————————————————

/// A string `pattern` constraint. Unlike a depends-on condition, a pattern
/// that fails to compile is dropped (never enforced) rather than failing
/// every value; the source text is kept for descriptors and messages.
#[derive(Debug, Clone)]
pub struct ConstraintPattern {
    source: String,
    regex: Option<Regex>,
}

impl ConstraintPattern {
    pub fn compile(source: &str) -> ConstraintPattern {
        let regex = Regex::new(source).ok();
        if regex.is_none() {
            log::warn!("pattern {source:?} did not compile and will not be enforced");
        }
        ConstraintPattern {
            source: source.to_string(),
            regex,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// `None` when the pattern was dropped at compile time.
    pub fn matches(&self, text: &str) -> Option<bool> {
        self.regex.as_ref().map(|rx| rx.is_match(text))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DATE HANDLING
// ————————————————————————————————————————————————————————————————————————————

/// Accepted textual date forms, widest first. Date-only text is midnight.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// NODE KINDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub required: bool,
    pub default_value: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<ConstraintPattern>,
    pub options: Vec<String>,
    pub depends_on: Vec<DependsOn>,
}

impl StringSchema {
    pub fn new() -> StringSchema {
        StringSchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
    pub fn pattern(mut self, source: &str) -> Self {
        self.pattern = Some(ConstraintPattern::compile(source));
        self
    }
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    pub required: bool,
    pub default_value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub options: Vec<f64>,
    pub depends_on: Vec<DependsOn>,
}

impl NumberSchema {
    pub fn new() -> NumberSchema {
        NumberSchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }
    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }
    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.options = options.into_iter().collect();
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    pub required: bool,
    pub default_value: Option<bool>,
    pub depends_on: Vec<DependsOn>,
}

impl BooleanSchema {
    pub fn new() -> BooleanSchema {
        BooleanSchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: bool) -> Self {
        self.default_value = Some(value);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateSchema {
    pub required: bool,
    pub default_value: Option<NaiveDateTime>,
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
    pub depends_on: Vec<DependsOn>,
}

impl DateSchema {
    pub fn new() -> DateSchema {
        DateSchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: NaiveDateTime) -> Self {
        self.default_value = Some(value);
        self
    }
    pub fn min(mut self, value: NaiveDateTime) -> Self {
        self.min = Some(value);
        self
    }
    pub fn max(mut self, value: NaiveDateTime) -> Self {
        self.max = Some(value);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumSchema {
    pub required: bool,
    pub default_value: Option<String>,
    pub values: Vec<String>,
    pub depends_on: Vec<DependsOn>,
}

impl EnumSchema {
    pub fn new<I, S>(values: I) -> EnumSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumSchema {
            values: values.into_iter().map(Into::into).collect(),
            ..EnumSchema::default()
        }
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Opaque payload that must be JSON-serializable.
#[derive(Debug, Clone, Default)]
pub struct JsonSchema {
    pub required: bool,
    pub default_value: Option<Value>,
    pub depends_on: Vec<DependsOn>,
}

impl JsonSchema {
    pub fn new() -> JsonSchema {
        JsonSchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Shared by the `Any` and `Unknown` kinds: accepts every value.
#[derive(Debug, Clone, Default)]
pub struct AnySchema {
    pub required: bool,
    pub depends_on: Vec<DependsOn>,
}

impl AnySchema {
    pub fn new() -> AnySchema {
        AnySchema::default()
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Exactly one item schema shared by all elements.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub required: bool,
    pub item: Box<SchemaNode>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub depends_on: Vec<DependsOn>,
}

impl ArraySchema {
    pub fn new(item: impl Into<SchemaNode>) -> ArraySchema {
        ArraySchema {
            required: false,
            item: Box::new(item.into()),
            min_length: None,
            max_length: None,
            depends_on: Vec::new(),
        }
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Ordered named properties. `min_length`/`max_length` bound the property
/// count, supporting object-as-map usage.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub required: bool,
    pub properties: IndexMap<String, SchemaNode>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub depends_on: Vec<DependsOn>,
}

impl ObjectSchema {
    pub fn new() -> ObjectSchema {
        ObjectSchema::default()
    }
    /// Declaration order is load-bearing: earlier siblings are visible to
    /// later depends-on checks during default derivation.
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<SchemaNode>) -> Self {
        self.properties.insert(name.into(), schema.into());
        self
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Open string-keyed map with homogeneous values. The key schema is
/// advisory for authoring UIs; validation checks entry counts and values.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub required: bool,
    pub key_schema: Box<SchemaNode>,
    pub value_schema: Box<SchemaNode>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub depends_on: Vec<DependsOn>,
}

impl RecordSchema {
    pub fn new(key_schema: impl Into<SchemaNode>, value_schema: impl Into<SchemaNode>) -> RecordSchema {
        RecordSchema {
            required: false,
            key_schema: Box::new(key_schema.into()),
            value_schema: Box::new(value_schema.into()),
            min_length: None,
            max_length: None,
            depends_on: Vec::new(),
        }
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }
}

/// Ordered alternatives, attempted in declared order during validation.
#[derive(Debug, Clone, Default)]
pub struct UnionSchema {
    pub required: bool,
    pub variants: Vec<SchemaNode>,
    pub depends_on: Vec<DependsOn>,
}

impl UnionSchema {
    pub fn new() -> UnionSchema {
        UnionSchema::default()
    }
    pub fn variant(mut self, schema: impl Into<SchemaNode>) -> Self {
        self.variants.push(schema.into());
        self
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
    pub fn when(mut self, field: &str, condition: &str) -> Self {
        self.depends_on.push(DependsOn::new(field, condition));
        self
    }

    /// Which variant does a value structurally belong to? First object
    /// variant whose declared property names all occur in the value wins;
    /// anything indistinguishable falls back to variant 0.
    pub fn detect_variant(&self, value: &Value) -> usize {
        if let Value::Object(map) = value {
            for (i, variant) in self.variants.iter().enumerate() {
                if let SchemaNode::Object(obj) = variant {
                    if obj.properties.keys().all(|k| map.contains_key(k)) {
                        return i;
                    }
                }
            }
        }
        0
    }

    /// Derived default for one variant, for switching a value over to it.
    pub fn variant_default(&self, index: usize) -> Value {
        self.variants
            .get(index)
            .map(derive_defaults)
            .unwrap_or(Value::Null)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// THE SUM TYPE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub enum SchemaNode {
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
    Date(DateSchema),
    Enum(EnumSchema),
    Json(JsonSchema),
    Any(AnySchema),
    Unknown(AnySchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    Record(RecordSchema),
    Union(UnionSchema),
}

impl SchemaNode {
    pub fn depends_on(&self) -> &[DependsOn] {
        match self {
            SchemaNode::String(s) => &s.depends_on,
            SchemaNode::Number(s) => &s.depends_on,
            SchemaNode::Boolean(s) => &s.depends_on,
            SchemaNode::Date(s) => &s.depends_on,
            SchemaNode::Enum(s) => &s.depends_on,
            SchemaNode::Json(s) => &s.depends_on,
            SchemaNode::Any(s) | SchemaNode::Unknown(s) => &s.depends_on,
            SchemaNode::Array(s) => &s.depends_on,
            SchemaNode::Object(s) => &s.depends_on,
            SchemaNode::Record(s) => &s.depends_on,
            SchemaNode::Union(s) => &s.depends_on,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            SchemaNode::String(s) => s.required,
            SchemaNode::Number(s) => s.required,
            SchemaNode::Boolean(s) => s.required,
            SchemaNode::Date(s) => s.required,
            SchemaNode::Enum(s) => s.required,
            SchemaNode::Json(s) => s.required,
            SchemaNode::Any(s) | SchemaNode::Unknown(s) => s.required,
            SchemaNode::Array(s) => s.required,
            SchemaNode::Object(s) => s.required,
            SchemaNode::Record(s) => s.required,
            SchemaNode::Union(s) => s.required,
        }
    }

    /// The declared leaf default, as a value. Containers and unions have
    /// none (arrays/records default to empty, unions to null).
    pub(crate) fn declared_default(&self) -> Option<Value> {
        match self {
            SchemaNode::String(s) => s.default_value.clone().map(Value::String),
            SchemaNode::Number(s) => s
                .default_value
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            SchemaNode::Boolean(s) => s.default_value.map(Value::Bool),
            SchemaNode::Date(s) => s
                .default_value
                .as_ref()
                .map(|dt| Value::String(format_datetime(dt))),
            SchemaNode::Enum(s) => s.default_value.clone().map(Value::String),
            SchemaNode::Json(s) => s.default_value.clone(),
            SchemaNode::Any(_)
            | SchemaNode::Unknown(_)
            | SchemaNode::Array(_)
            | SchemaNode::Object(_)
            | SchemaNode::Record(_)
            | SchemaNode::Union(_) => None,
        }
    }
}

impl From<StringSchema> for SchemaNode {
    fn from(s: StringSchema) -> SchemaNode {
        SchemaNode::String(s)
    }
}
impl From<NumberSchema> for SchemaNode {
    fn from(s: NumberSchema) -> SchemaNode {
        SchemaNode::Number(s)
    }
}
impl From<BooleanSchema> for SchemaNode {
    fn from(s: BooleanSchema) -> SchemaNode {
        SchemaNode::Boolean(s)
    }
}
impl From<DateSchema> for SchemaNode {
    fn from(s: DateSchema) -> SchemaNode {
        SchemaNode::Date(s)
    }
}
impl From<EnumSchema> for SchemaNode {
    fn from(s: EnumSchema) -> SchemaNode {
        SchemaNode::Enum(s)
    }
}
impl From<JsonSchema> for SchemaNode {
    fn from(s: JsonSchema) -> SchemaNode {
        SchemaNode::Json(s)
    }
}
impl From<AnySchema> for SchemaNode {
    fn from(s: AnySchema) -> SchemaNode {
        SchemaNode::Any(s)
    }
}
impl From<ArraySchema> for SchemaNode {
    fn from(s: ArraySchema) -> SchemaNode {
        SchemaNode::Array(s)
    }
}
impl From<ObjectSchema> for SchemaNode {
    fn from(s: ObjectSchema) -> SchemaNode {
        SchemaNode::Object(s)
    }
}
impl From<RecordSchema> for SchemaNode {
    fn from(s: RecordSchema) -> SchemaNode {
        SchemaNode::Record(s)
    }
}
impl From<UnionSchema> for SchemaNode {
    fn from(s: UnionSchema) -> SchemaNode {
        SchemaNode::Union(s)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_chains_constraints() {
        let schema: SchemaNode = StringSchema::new()
            .min_length(2)
            .max_length(50)
            .pattern("^[a-z]+$")
            .required()
            .into();
        let SchemaNode::String(s) = &schema else {
            panic!("expected string node");
        };
        assert!(s.required);
        assert_eq!(s.min_length, Some(2));
        assert_eq!(s.max_length, Some(50));
        assert_eq!(s.pattern.as_ref().map(|p| p.source()), Some("^[a-z]+$"));
    }

    #[test]
    fn malformed_constraint_pattern_is_kept_but_unenforced() {
        let p = ConstraintPattern::compile("([broken");
        assert_eq!(p.source(), "([broken");
        assert_eq!(p.matches("anything"), None);
    }

    #[test]
    fn object_properties_keep_declaration_order() {
        let node = SchemaNode::from(
            ObjectSchema::new()
                .property("z", StringSchema::new())
                .property("a", NumberSchema::new())
                .property("m", BooleanSchema::new()),
        );
        let SchemaNode::Object(obj) = node else {
            panic!("expected object node");
        };
        let names: Vec<_> = obj.properties.keys().cloned().collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn detect_variant_matches_by_property_name_set() {
        let union = UnionSchema::new()
            .variant(
                ObjectSchema::new()
                    .property("host", StringSchema::new())
                    .property("port", NumberSchema::new()),
            )
            .variant(ObjectSchema::new().property("socket", StringSchema::new()));

        assert_eq!(union.detect_variant(&json!({"socket": "/tmp/x"})), 1);
        assert_eq!(union.detect_variant(&json!({"host": "a", "port": 1})), 0);
        // indistinguishable values fall back to the first variant
        assert_eq!(union.detect_variant(&json!({"unrelated": true})), 0);
        assert_eq!(union.detect_variant(&json!("scalar")), 0);
    }

    #[test]
    fn parse_datetime_accepts_common_forms() {
        assert!(parse_datetime("2024-03-01T12:30:00Z").is_some());
        assert!(parse_datetime("2024-03-01T12:30:00").is_some());
        assert!(parse_datetime("2024-03-01T12:30").is_some());
        let midnight = parse_datetime("2024-03-01").unwrap();
        assert_eq!(format_datetime(&midnight), "2024-03-01T00:00:00");
        assert!(parse_datetime("not a date").is_none());
    }
}
