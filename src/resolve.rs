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

//! Narrowing a filtered listing down to exactly one resource id.

use serde::Deserialize;
use thiserror::Error;

/// Named, optional filters for a listing call. Names are the API's query
/// parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    entries: Vec<(String, Option<String>)>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Later entries with the same name replace earlier ones.
    pub fn with(mut self, name: &str, value: Option<String>) -> Self {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), value));
        self
    }

    /// Filters that carry a non-blank value, trimmed, in insertion order.
    pub fn usable(&self) -> Vec<(&str, String)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then(|| (name.as_str(), value.to_string()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.usable().is_empty()
    }
}

/// A listing item. Only the id is needed to resolve; the name is kept for
/// messages.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no filter was provided; refusing to match against every resource")]
    NoFilterProvided,
    #[error("no resources found with the given filter")]
    NoResourcesFound,
    #[error("multiple resources found with the given filter")]
    AmbiguousFilter { candidates: Vec<String> },
    #[error("listing resources failed")]
    Transport {
        #[source]
        cause: anyhow::Error,
    },
}

/// Returns the id of the single resource matching `criteria`.
///
/// `list` is called at most once, and never when `criteria` has no usable
/// filter.
pub fn resolve<F>(criteria: &FilterCriteria, list: F) -> Result<String, ResolveError>
where
    F: FnOnce(&FilterCriteria) -> anyhow::Result<Vec<ResourceRecord>>,
{
    if criteria.is_empty() {
        return Err(ResolveError::NoFilterProvided);
    }
    tracing::debug!(filters = ?criteria.usable(), "resolving single resource");

    let mut records = list(criteria).map_err(|cause| ResolveError::Transport { cause })?;
    tracing::debug!(matches = records.len(), "listing returned");

    match records.len() {
        0 => Err(ResolveError::NoResourcesFound),
        1 => {
            let record = records.remove(0);
            tracing::debug!(id = %record.id, name = ?record.name, "matched single resource");
            Ok(record.id)
        }
        _ => Err(ResolveError::AmbiguousFilter {
            candidates: records.into_iter().map(|r| r.id).collect(),
        }),
    }
}
