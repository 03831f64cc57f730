// didata - CLI for the Dimension Data CloudControl API
// Copyright (C) 2024 The didata developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Flattening of nested API responses into dotted `key: value` listings.
//!
//! `{"nic": {"privateIpv4": "10.0.0.5"}}` becomes `nic.privateIpv4 = 10.0.0.5`.
//! Arrays of objects are merged under their parent key unless
//! [`SequenceKeys::Indexed`] is requested, in which case the element index
//! becomes part of the path.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Nesting level past which branches are skipped.
pub const MAX_DEPTH: usize = 64;

/// A leaf value in a flattened response.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

impl Scalar {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

pub type FlatMap = BTreeMap<String, Scalar>;

/// How array elements contribute to the flattened key path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequenceKeys {
    /// Object elements share their parent's key; colliding inner keys keep
    /// the last element's value. Scalar elements are dropped.
    #[default]
    Shared,
    /// The element index is part of the path (`disk.0.sizeGb`), scalar
    /// elements are kept as `key.N`.
    Indexed,
}

/// Flattens a response object. A non-object root yields an empty map.
///
/// Keys are visited in document order, so when two paths flatten to the same
/// key the one appearing later in the response wins.
pub fn flatten_with(root: &Value, mode: SequenceKeys) -> FlatMap {
    let mut out = FlatMap::new();
    if let Value::Object(map) = root {
        walk_object(map, None, mode, 0, &mut out);
    }
    out
}

fn walk_object(
    map: &Map<String, Value>,
    prefix: Option<&str>,
    mode: SequenceKeys,
    depth: usize,
    out: &mut FlatMap,
) {
    if depth >= MAX_DEPTH {
        tracing::warn!(
            path = prefix.unwrap_or(""),
            "response nested deeper than {MAX_DEPTH} levels, skipping branch"
        );
        return;
    }

    for (key, value) in map {
        let path = match prefix {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };
        walk_value(value, path, mode, depth, out);
    }
}

fn walk_value(value: &Value, path: String, mode: SequenceKeys, depth: usize, out: &mut FlatMap) {
    match value {
        Value::Object(inner) => walk_object(inner, Some(&path), mode, depth + 1, out),
        Value::Array(items) => walk_array(items, &path, mode, depth, out),
        scalar => {
            if let Some(s) = Scalar::from_value(scalar) {
                out.insert(path, s);
            }
        }
    }
}

fn walk_array(items: &[Value], path: &str, mode: SequenceKeys, depth: usize, out: &mut FlatMap) {
    if depth >= MAX_DEPTH {
        tracing::warn!(path, "response nested deeper than {MAX_DEPTH} levels, skipping branch");
        return;
    }
    for (index, item) in items.iter().enumerate() {
        match (mode, item) {
            (SequenceKeys::Shared, Value::Object(inner)) => {
                walk_object(inner, Some(path), mode, depth + 1, out)
            }
            (SequenceKeys::Shared, _) => {}
            (SequenceKeys::Indexed, element) => {
                walk_value(element, format!("{path}.{index}"), mode, depth + 1, out)
            }
        }
    }
}
