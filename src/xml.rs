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

//! Documents from the legacy XML API, read into `serde_json::Value` so they
//! render through the same flattener as JSON responses.
//!
//! `<ns4:Status><ns4:resultDetail>ok</ns4:resultDetail></ns4:Status>` becomes
//! `{"Status": {"resultDetail": "ok"}}`. Namespace prefixes and `xmlns`
//! bindings are dropped, attributes and child elements both become keys, and
//! a child repeated under one parent becomes an array.

use anyhow::{Result, anyhow};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

/// Namespace of the backup schemas.
pub const BACKUP_NS: &str = "http://oec.api.opsource.net/schemas/backup";
/// Namespace of the classic network schemas.
pub const NETWORK_NS: &str = "http://oec.api.opsource.net/schemas/network";

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            fields.insert(key, Value::String(attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    /// Text-only elements become strings and empty ones `null`. Text next to
    /// attributes or children is kept under `text`.
    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = match (self.fields.is_empty(), text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(text.to_string()),
            (false, true) => Value::Object(self.fields),
            (false, false) => {
                let mut fields = self.fields;
                fields.insert("text".into(), Value::String(text.to_string()));
                Value::Object(fields)
            }
        };
        (self.name, value)
    }
}

fn attach(fields: &mut Map<String, Value>, key: String, value: Value) {
    match fields.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(key, value);
        }
    }
}

/// Parses `text` into `{"<root element>": ...}`.
pub fn to_value(text: &str) -> Result<Value> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<Element> = Vec::new();

    loop {
        let closed = match reader.read_event()? {
            Event::Start(start) => {
                open.push(Element::open(&start)?);
                continue;
            }
            Event::Empty(start) => Element::open(&start)?.close(),
            Event::End(_) => open
                .pop()
                .ok_or_else(|| anyhow!("closing tag without an open element"))?
                .close(),
            Event::Text(text) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
                continue;
            }
            Event::CData(data) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
                continue;
            }
            Event::Eof => return Err(anyhow!("XML document ended before its root element closed")),
            _ => continue,
        };

        let (name, value) = closed;
        match open.last_mut() {
            Some(parent) => attach(&mut parent.fields, name, value),
            None => {
                let mut root = Map::new();
                root.insert(name, value);
                return Ok(Value::Object(root));
            }
        }
    }
}

/// `<name>text</name>` with the text escaped, or nothing for `None`.
pub fn text_element(name: &str, text: Option<&str>) -> String {
    match text {
        Some(text) => format!("<{name}>{}</{name}>", escape(text)),
        None => String::new(),
    }
}
