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

//! Terminal output for API responses.

use crate::client::ResponseData;
use crate::flatten::{FlatMap, SequenceKeys, flatten_with};
use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// How one resource kind is summarised in a listing: the field used as the
/// bold headline and the labelled fields printed under it.
///
/// `item_key` names the array of items in the page. A key starting with `/`
/// is a JSON pointer, for documents that nest their items.
pub struct ListView {
    pub item_key: &'static str,
    pub headline: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    pub output: OutputFormat,
    pub keys: SequenceKeys,
}

impl Renderer {
    pub fn new(output: OutputFormat, keys: SequenceKeys) -> Self {
        Self { output, keys }
    }

    /// A single resource as sorted `key: value` lines.
    pub fn item(&self, response: &ResponseData) -> Result<()> {
        let Some(json) = self.structured(response)? else {
            return Ok(());
        };
        for line in flat_lines(&flatten_with(json, self.keys)) {
            println!("{line}");
        }
        Ok(())
    }

    /// The acknowledgement of a POST: the API message, then the rest.
    pub fn action(&self, response: &ResponseData) -> Result<()> {
        let Some(json) = self.structured(response)? else {
            return Ok(());
        };
        let (message, lines) = action_lines(json, self.keys);
        if let Some(message) = message {
            println!("{}", message.green().bold());
        }
        for line in lines {
            println!("{line}");
        }
        Ok(())
    }

    /// A page of resources. With `dump_all` every item is flattened instead
    /// of summarised.
    pub fn listing(&self, response: &ResponseData, view: &ListView, dump_all: bool) -> Result<()> {
        let Some(json) = self.structured(response)? else {
            return Ok(());
        };
        let items = listed_items(json, view.item_key);

        if items.is_empty() {
            println!("No resources found.");
            return Ok(());
        }

        for item in &items {
            let headline = item
                .get(view.headline)
                .map(value_to_str)
                .unwrap_or_default();
            println!("{}", headline.bold());
            let lines = if dump_all {
                flat_lines(&flatten_with(item, self.keys))
            } else {
                summary_lines(item, view.fields)
            };
            for line in lines {
                println!("{line}");
            }
            println!();
        }

        if let Some(footer) = page_footer(json, items.len()) {
            println!("{}", footer.dimmed());
        }
        Ok(())
    }

    /// Prints the body itself for JSON output or non-JSON bodies; returns
    /// the parsed document only when the caller should render it.
    fn structured<'a>(&self, response: &'a ResponseData) -> Result<Option<&'a Value>> {
        match (&response.json, self.output) {
            (Some(json), OutputFormat::Pretty) => Ok(Some(json)),
            (Some(json), OutputFormat::Json) => {
                println!("{}", serde_json::to_string_pretty(json)?);
                Ok(None)
            }
            (None, _) => {
                println!("{}", response.body);
                Ok(None)
            }
        }
    }
}

/// The items under `key`. A lone object counts as a one-item listing, which
/// is how XML documents with a single child read.
pub fn listed_items<'a>(json: &'a Value, key: &str) -> Vec<&'a Value> {
    let found = if key.starts_with('/') {
        json.pointer(key)
    } else {
        json.get(key)
    };
    match found {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

pub fn flat_lines(flat: &FlatMap) -> Vec<String> {
    flat.iter().map(|(k, v)| format!("{k}: {v}")).collect()
}

/// `Label: value` for every field present in `item`.
pub fn summary_lines(item: &Value, fields: &[(&str, &str)]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|(label, pointer)| {
            let value = item.pointer(pointer)?;
            is_non_empty(value).then(|| format!("{label}: {}", value_to_str(value)))
        })
        .collect()
}

/// Flattened key of the message in a legacy XML acknowledgement.
const LEGACY_DETAIL: &str = "Status.resultDetail";

/// Splits an operation response into its message and the remaining lines.
/// `info` name/value pairs are printed as `name: value`.
pub fn action_lines(json: &Value, keys: SequenceKeys) -> (Option<String>, Vec<String>) {
    let mut lines: Vec<String> = json
        .get("info")
        .and_then(Value::as_array)
        .map(|infos| {
            infos
                .iter()
                .filter_map(|info| {
                    let name = info.get("name")?.as_str()?;
                    let value = info.get("value").map(value_to_str).unwrap_or_default();
                    Some(format!("{name}: {value}"))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut rest = json.clone();
    if let Some(map) = rest.as_object_mut() {
        map.remove("message");
        map.remove("info");
    }
    let mut flat = flatten_with(&rest, keys);
    let message = json
        .get("message")
        .map(value_to_str)
        .or_else(|| flat.remove(LEGACY_DETAIL).map(|detail| detail.to_string()));
    lines.extend(flat_lines(&flat));
    (message, lines)
}

fn page_footer(json: &Value, shown: usize) -> Option<String> {
    let total = json.get("totalCount")?.as_u64()?;
    if total as usize <= shown {
        return None;
    }
    let page = json.get("pageNumber").and_then(Value::as_u64).unwrap_or(1);
    let pages = json.get("pageCount").and_then(Value::as_u64).unwrap_or(page);
    Some(format!(
        "Showing {shown} of {total} (page {page} of {pages}); use --page-number to see more"
    ))
}

pub fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
