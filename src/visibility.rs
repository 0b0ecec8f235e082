//! Conditional visibility: `depends-on` rule evaluation.
//!
//! A node carries zero or more `{field, condition}` rules. The node is
//! active when every rule matches (AND semantics); an empty rule list is
//! always active.
//!
//! Conditions are compiled once, when the schema is built or decoded. A
//! source of the form `/body/flags` is compiled with those flags; any other
//! text is compiled as a plain pattern. A pattern that fails to compile
//! becomes a never-matching sentinel, so a malformed condition hides the
//! dependent field instead of crashing.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::path::{Path, Segment, get_nested_value};

// recognizes the /body/flags literal form
static LITERAL_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/(.*)/(\w*)$").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// CONDITIONS
// ————————————————————————————————————————————————————————————————————————————

/// A condition pattern, compiled at build time. Keeps the source text for
/// descriptor round-trips; a failed compile is the never-matching sentinel.
#[derive(Debug, Clone)]
pub struct Condition {
    source: String,
    regex: Option<Regex>,
}

impl Condition {
    pub fn compile(source: &str) -> Condition {
        let regex = compile_pattern(source);
        if regex.is_none() {
            log::trace!("condition {source:?} did not compile; it will never match");
        }
        Condition {
            source: source.to_string(),
            regex,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A malformed condition is visible as a build-time fact.
    pub fn never_matches(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Some(rx) => rx.is_match(text),
            None => false,
        }
    }
}

fn compile_pattern(source: &str) -> Option<Regex> {
    if let Some(caps) = LITERAL_FORM.captures(source) {
        let mut builder = RegexBuilder::new(&caps[1]);
        for flag in caps[2].chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                // host flags that do not affect match testing
                'd' | 'g' | 'u' | 'v' | 'y' => {}
                _ => return None,
            }
        }
        return builder.build().ok();
    }
    Regex::new(source).ok()
}

/// One visibility rule: the addressed field's value, coerced to text, must
/// match the condition.
#[derive(Debug, Clone)]
pub struct DependsOn {
    pub field: Path,
    pub condition: Condition,
}

impl DependsOn {
    pub fn new(field: &str, condition: &str) -> DependsOn {
        DependsOn {
            field: Path::parse(field),
            condition: Condition::compile(condition),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EVALUATION
// ————————————————————————————————————————————————————————————————————————————

/// Is a node carrying these rules currently active?
///
/// `current_path` is the full path of the node being evaluated; it anchors
/// sibling-relative field paths inside repeated structures (see
/// [`resolve_in_scope`]).
pub fn evaluate_depends_on(rules: &[DependsOn], values: &Value, current_path: &Path) -> bool {
    rules.iter().all(|rule| {
        let resolved = resolve_in_scope(&rule.field, current_path);
        let text = coerce_text(get_nested_value(values, &resolved));
        let matched = rule.condition.is_match(&text);
        log::trace!(
            "depends-on {} ~ {:?} at {current_path}: value {text:?} -> {matched}",
            resolved,
            rule.condition.source(),
        );
        matched
    })
}

/// Resolve a rule's field path to the same repetition instance as
/// `current_path`.
///
/// Walk the two paths together; on a mismatch where `current_path` holds an
/// index segment, splice that index into the field path and keep comparing
/// after the splice. A best-effort heuristic: once the paths diverge on
/// names, the rest of the field path is taken as-is.
pub fn resolve_in_scope(field: &Path, current_path: &Path) -> Path {
    let field_segs = field.segments();
    let current_segs = current_path.segments();

    let mut out: Vec<Segment> = Vec::with_capacity(field_segs.len());
    let mut fi = 0;
    let mut ci = 0;
    while fi < field_segs.len() && ci < current_segs.len() {
        if field_segs[fi] == current_segs[ci] {
            out.push(field_segs[fi].clone());
            fi += 1;
            ci += 1;
            continue;
        }
        if let Segment::Index(i) = current_segs[ci] {
            out.push(Segment::Index(i));
            ci += 1;
            continue;
        }
        break;
    }
    out.extend(field_segs[fi..].iter().cloned());
    Path::from_segments(out)
}

/// Text form a condition is tested against. Absent and null coerce to the
/// empty string; containers serialize to compact JSON.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
