//! Typed path addressing over JSON value trees.
//!
//! One parser produces the `Name | Index` segment form; everything else in
//! the crate consumes that form instead of re-checking "is this segment
//! numeric" at every call site.
//!
//! - `get` returns absent (`None`) as soon as any intermediate is absent.
//! - `set` auto-vivifies: missing intermediates are created with the kind
//!   implied by the *next* segment, wrong-kind intermediates are replaced
//!   with the kind implied by the segment being applied.
//! - `set` never replaces the root's kind; a mismatch there is a silent
//!   no-op. Mutation stays confined to the root→target path.

use serde_json::Value;
use std::fmt;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One step into a value tree: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Name(String),
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Segment {
        // purely-numeric segments denote sequence indices
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = raw.parse::<usize>() {
                return Segment::Index(i);
            }
        }
        Segment::Name(raw.to_string())
    }

    /// The empty container this segment kind indexes into.
    fn empty_container(&self) -> Value {
        match self {
            Segment::Name(_) => Value::Object(serde_json::Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        }
    }

    /// Whether `value` is a container a write through this segment can use.
    /// A map is the wrong kind for an index segment: `set` replaces it.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Segment::Name(_) => value.is_object(),
            Segment::Index(_) => value.is_array(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(n) => f.write_str(n),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// An ordered sequence of segments, encoded as dot-joined text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Path {
        Path(Vec::new())
    }

    /// Total parser: any text is a path. The empty string is the root.
    pub fn parse(text: &str) -> Path {
        if text.is_empty() {
            return Path::root();
        }
        Path(text.split('.').map(Segment::parse).collect())
    }

    pub fn from_segments(segments: Vec<Segment>) -> Path {
        Path(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn child(&self, segment: Segment) -> Path {
        let mut out = self.clone();
        out.push(segment);
        out
    }
}

impl From<&str> for Path {
    fn from(text: &str) -> Path {
        Path::parse(text)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GET
// ————————————————————————————————————————————————————————————————————————————

/// Descend through maps/sequences; `None` as soon as anything is absent.
///
/// An `Index` segment against a map looks up the decimal string key, matching
/// how renderers address map-held rows.
pub fn get_nested_value<'a>(values: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = values;
    for seg in path.segments() {
        current = match (seg, current) {
            (Segment::Name(name), Value::Object(map)) => map.get(name)?,
            (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
            (Segment::Index(i), Value::Object(map)) => map.get(i.to_string().as_str())?,
            _ => return None,
        };
    }
    Some(current)
}

// ————————————————————————————————————————————————————————————————————————————
// SET
// ————————————————————————————————————————————————————————————————————————————

/// Write `value` at `path`, creating or replacing intermediates as needed.
///
/// The root is the one container that is never replaced: if its kind cannot
/// satisfy the first segment, the call is a no-op. An empty path is also a
/// no-op (the root itself is not addressable).
pub fn set_nested_value(values: &mut Value, path: &Path, value: Value) {
    let segments = path.segments();
    let Some((last, inner)) = segments.split_last() else {
        return;
    };

    if !segments[0].accepts(values) {
        return;
    }

    let mut current = values;
    for (i, seg) in inner.iter().enumerate() {
        if !seg.accepts(current) {
            *current = seg.empty_container();
        }
        current = descend(current, seg, &segments[i + 1]);
    }

    if !last.accepts(current) {
        *current = last.empty_container();
    }
    write_slot(current, last, value);
}

/// Step into `current[seg]`, materializing a container (kind chosen by the
/// following segment) when the slot is missing, null, or a non-container.
fn descend<'a>(current: &'a mut Value, seg: &Segment, next: &Segment) -> &'a mut Value {
    match (seg, current) {
        (Segment::Name(name), Value::Object(map)) => {
            let slot = map.entry(name.clone()).or_insert(Value::Null);
            if !(slot.is_object() || slot.is_array()) {
                *slot = next.empty_container();
            }
            slot
        }
        (Segment::Index(i), Value::Array(items)) => {
            if *i >= items.len() {
                items.resize(*i + 1, Value::Null);
            }
            let slot = &mut items[*i];
            if !(slot.is_object() || slot.is_array()) {
                *slot = next.empty_container();
            }
            slot
        }
        // unreachable: accepts() was checked by the caller
        _ => unreachable!("descend on wrong-kind container"),
    }
}

fn write_slot(current: &mut Value, seg: &Segment, value: Value) {
    match (seg, current) {
        (Segment::Name(name), Value::Object(map)) => {
            map.insert(name.clone(), value);
        }
        (Segment::Index(i), Value::Array(items)) => {
            if *i >= items.len() {
                items.resize(*i + 1, Value::Null);
            }
            items[*i] = value;
        }
        _ => unreachable!("write on wrong-kind container"),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
