// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Free-text location matching
//!
//! Recording metadata names brain regions inconsistently: acronyms, full
//! names, mixed case, structured strings such as `{'area': 'VISp', 'depth': 20}`
//! or `area: VISp, depth: 20`, and comma-separated lists. [`LocationMatcher`]
//! resolves all of those against a [`StructureGraph`].

use std::collections::HashSet;
use std::sync::Arc;

use crate::graph::{StructureGraph, StructureNode};

/// Location strings that carry no anatomical information (compared lowercased)
pub const PLACEHOLDER_LOCATIONS: &[&str] = &[
    "unknown",
    "none",
    "",
    " ",
    "n/a",
    "void",
    "unspecific",
    "na",
    "not applicable",
    "other",
    "nan",
];

const LOCATION_SEPARATOR: char = ',';
const AREA_KEY: &str = "area";
const AREA_PREFIX: &str = "area:";

/// True if the trimmed, lowercased string is a known placeholder
pub fn is_placeholder(location: &str) -> bool {
    let lowered = location.trim().to_lowercase();
    PLACEHOLDER_LOCATIONS.contains(&lowered.as_str())
}

/// Resolves location strings to structure graph nodes
#[derive(Debug, Clone)]
pub struct LocationMatcher {
    graph: Arc<StructureGraph>,
}

impl LocationMatcher {
    pub fn new(graph: Arc<StructureGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &StructureGraph {
        &self.graph
    }

    /// Match a raw location string
    ///
    /// Returns an empty list for placeholders and unresolvable input. A
    /// list of separated labels yields the union of the matched labels,
    /// in input order, without duplicates.
    pub fn match_location(&self, location: &str) -> Vec<&StructureNode> {
        let location = location.trim();
        if is_placeholder(location) {
            return Vec::new();
        }

        if let Some(node) = self.graph.resolve(location) {
            return vec![node];
        }

        // the other fields of a structured string are never matched
        if let Some(area) = extract_area(location) {
            return self.match_location(&area);
        }

        if location.contains(LOCATION_SEPARATOR) {
            let mut seen = HashSet::new();
            let mut matched = Vec::new();
            for part in location.split(LOCATION_SEPARATOR) {
                let part = part.trim();
                if is_placeholder(part) {
                    continue;
                }
                if let Some(node) = self.graph.resolve(part) {
                    if seen.insert(node.id) {
                        matched.push(node);
                    }
                }
            }
            return matched;
        }

        Vec::new()
    }

    /// True if the location resolves to at least one node
    pub fn is_match(&self, location: &str) -> bool {
        !self.match_location(location).is_empty()
    }
}

/// Pull the `area` value out of a structured location string
///
/// Understands a brace-delimited mapping (`{'area': 'VISp', ...}`, quoted
/// or not) and a leading `area:` key. Returns `None` when there is no
/// non-empty area value.
pub fn extract_area(location: &str) -> Option<String> {
    let location = location.trim();

    if location.starts_with('{') {
        return area_from_mapping(location);
    }

    let rest = location.strip_prefix(AREA_PREFIX)?;
    let value = rest.split(LOCATION_SEPARATOR).next()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn area_from_mapping(mapping: &str) -> Option<String> {
    let body = mapping.strip_prefix('{')?.strip_suffix('}')?;

    for item in split_unquoted(body, LOCATION_SEPARATOR) {
        let Some((key, value)) = split_once_unquoted(item, ':') else {
            continue;
        };
        if unquote(key) != AREA_KEY {
            continue;
        }
        let value = unquote(value);
        return if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
    None
}

/// Split on `separator`, ignoring separators inside single or double quotes
fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (offset, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == separator => {
                parts.push(&text[start..offset]);
                start = offset + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_unquoted(text: &str, separator: char) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (offset, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == separator => {
                return Some((&text[..offset], &text[offset + c.len_utf8()..]));
            }
            None => {}
        }
    }
    None
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner.trim();
        }
    }
    text
}
