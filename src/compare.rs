//! Structural comparison of SVG documents.
//!
//! Two documents match when they have the same elements, in the same order,
//! with the same attributes and the same (trimmed) text. Attribute values
//! that are number lists (`points`, `viewBox`, `x`, …) are compared
//! number by number within [`FLOAT_TOLERANCE`], so `85` and
//! `85.00000000000001` are equal. Comments, processing instructions and
//! whitespace-only text are ignored.

use std::collections::BTreeSet;

use crate::dom::{Element, Node, Tree, XmlElement};
use crate::parse::parse_numbers;

/// Absolute tolerance for numeric attribute values.
pub const FLOAT_TOLERANCE: f64 = 1e-6;

/// Outcome of [`compare_svg`].
#[derive(Debug, Clone, PartialEq)]
pub enum CompareResult {
    /// Same structure, numbers within tolerance
    Match,
    /// Differences, one per line, each prefixed with the element path
    Mismatch { details: String },
    /// One of the inputs is not well-formed XML
    ParseError { details: String },
}

impl CompareResult {
    pub fn is_match(&self) -> bool {
        matches!(self, CompareResult::Match)
    }
}

/// Compare `actual` against `expected`.
pub fn compare_svg(expected: &str, actual: &str) -> CompareResult {
    let expected_tree = match Tree::parse("expected", expected) {
        Ok(tree) => tree,
        Err(e) => {
            return CompareResult::ParseError {
                details: format!("failed to parse expected SVG: {e}"),
            };
        }
    };
    let actual_tree = match Tree::parse("actual", actual) {
        Ok(tree) => tree,
        Err(e) => {
            return CompareResult::ParseError {
                details: format!("failed to parse actual SVG: {e}"),
            };
        }
    };

    let mut diffs = Vec::new();
    let path = format!("/{}", expected_tree.root.qualified_name());
    compare_elements(&expected_tree.root, &actual_tree.root, &path, &mut diffs);
    if diffs.is_empty() {
        CompareResult::Match
    } else {
        CompareResult::Mismatch {
            details: diffs.join("\n"),
        }
    }
}

/// Children that take part in the comparison.
enum Significant<'a> {
    Element(&'a Element),
    Text(&'a str),
}

fn significant(el: &Element) -> Vec<Significant<'_>> {
    el.children()
        .iter()
        .filter_map(|node| match node {
            Node::Element(child) => Some(Significant::Element(child)),
            Node::Text(text) if !text.trim().is_empty() => Some(Significant::Text(text.trim())),
            _ => None,
        })
        .collect()
}

fn compare_elements(expected: &Element, actual: &Element, path: &str, diffs: &mut Vec<String>) {
    if expected.tag() != actual.tag() || expected.namespace() != actual.namespace() {
        diffs.push(format!(
            "{path}: expected <{}>, found <{}>",
            expected.qualified_name(),
            actual.qualified_name()
        ));
        return;
    }

    let names: BTreeSet<&str> = expected
        .attrs()
        .chain(actual.attrs())
        .map(|(name, _)| name)
        .collect();
    for name in names {
        match (expected.attr(name), actual.attr(name)) {
            (Some(e), Some(a)) if !values_match(e, a) => {
                diffs.push(format!("{path}: @{name} expected {e:?}, found {a:?}"));
            }
            (Some(e), None) => diffs.push(format!("{path}: @{name}={e:?} missing")),
            (None, Some(a)) => diffs.push(format!("{path}: unexpected @{name}={a:?}")),
            _ => {}
        }
    }

    let expected_children = significant(expected);
    let actual_children = significant(actual);
    if expected_children.len() != actual_children.len() {
        diffs.push(format!(
            "{path}: expected {} children, found {}",
            expected_children.len(),
            actual_children.len()
        ));
    }
    for (i, pair) in expected_children.iter().zip(&actual_children).enumerate() {
        match pair {
            (Significant::Element(e), Significant::Element(a)) => {
                let child_path = match e.id() {
                    Some(id) => format!("{path}/{}#{id}", e.qualified_name()),
                    None => format!("{path}/{}[{i}]", e.qualified_name()),
                };
                compare_elements(e, a, &child_path, diffs);
            }
            (Significant::Text(e), Significant::Text(a)) => {
                if e != a {
                    diffs.push(format!("{path}: text expected {e:?}, found {a:?}"));
                }
            }
            _ => diffs.push(format!("{path}: child {i} differs in kind")),
        }
    }
}

fn values_match(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    match (parse_numbers(expected, "value"), parse_numbers(actual, "value")) {
        (Ok(e), Ok(a)) if !e.is_empty() && e.len() == a.len() => e
            .iter()
            .zip(&a)
            .all(|(e, a)| (e.value - a.value).abs() <= FLOAT_TOLERANCE),
        _ => false,
    }
}
