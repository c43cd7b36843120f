//! Single-pass slot filling for kernel and wrapper templates.
//!
//! A slot is `{{NAME}}` with `NAME` matching `[A-Z_][A-Z0-9_]*`. Any other
//! brace sequence is literal text. Templates are split into segments once;
//! rendering walks the segments and never scans a substituted value, so a
//! value that happens to contain slot syntax is copied through untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GenError;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

#[derive(Clone, Debug)]
pub struct Template {
    name: &'static str,
    segments: Vec<Segment>,
}

/// Slot name → value.
pub type Bindings = BTreeMap<&'static str, String>;

impl Template {
    pub fn parse(name: &'static str, text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            match slot_at(after) {
                Some(slot) => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot.to_string()));
                    rest = &after[slot.len() + 2..];
                }
                None => {
                    literal.push_str(&rest[..open + 1]);
                    rest = &rest[open + 1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }

        Self { name, segments }
    }

    /// Distinct slot names, sorted.
    pub fn slots(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }

    /// Fill every slot. A slot without a value, or a value without a slot,
    /// is a generator bug and fails the render.
    pub fn render(&self, bindings: &Bindings) -> Result<String, GenError> {
        let slots = self.slots();
        if let Some(unused) = bindings.keys().find(|k| !slots.contains(*k)) {
            return Err(GenError::UnusedBinding {
                template: self.name,
                binding: unused.to_string(),
            });
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    let value = bindings
                        .get(slot.as_str())
                        .ok_or_else(|| GenError::UnresolvedSlot {
                            template: self.name,
                            slot: slot.clone(),
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// If `text` starts with `NAME}}`, return `NAME`.
fn slot_at(text: &str) -> Option<&str> {
    let end = text.find("}}")?;
    let name = &text[..end];
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_uppercase() || first == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    valid.then_some(name)
}

/// First slot marker left in `text`, if any.
pub fn find_marker(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        if let Some(slot) = slot_at(&rest[open + 2..]) {
            return Some(slot);
        }
        rest = &rest[open + 1..];
    }
    None
}
