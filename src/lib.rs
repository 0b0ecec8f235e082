//! Schema, defaults, path-addressing and validation engine for dynamic
//! forms.
//!
//! Describe a data shape once as a [`SchemaNode`] tree and get, from that
//! single description:
//!
//! - a plain, serializable [`Descriptor`] any renderer can consume,
//! - a derived default value honoring conditional visibility,
//! - dotted/indexed get/set into arbitrarily nested values,
//! - structural + semantic validation, including depends-on visibility and
//!   union/record polymorphism.
//!
//! Design notes:
//! - Pure and synchronous: immutable schema trees, snapshot value trees;
//!   the only mutation is the explicit [`set_nested_value`], and it stays
//!   confined to the root→target path.
//! - Expected failures are data (`{path, message}` lists), never panics;
//!   malformed condition patterns degrade to never-matching sentinels.
//! - Order matters everywhere: object properties keep declaration order,
//!   defaults see earlier siblings, and error lists are deterministic.

pub mod defaults;
pub mod descriptor;
pub mod path;
pub mod schema;
pub mod validate;
pub mod visibility;

pub use defaults::derive_defaults;
pub use descriptor::{Descriptor, DescriptorError};
pub use path::{Path, Segment, get_nested_value, set_nested_value};
pub use schema::{
    AnySchema, ArraySchema, BooleanSchema, ConstraintPattern, DateSchema, EnumSchema, JsonSchema,
    NumberSchema, ObjectSchema, RecordSchema, SchemaNode, StringSchema, UnionSchema,
};
pub use validate::{ValidationError, ValidationReport, validate_form};
pub use visibility::{Condition, DependsOn, evaluate_depends_on};
