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

//! Subcommand trees, one module per resource group. Every handler gets the
//! same [`Context`]: the API client built once in `main` and the renderer.

pub mod backup;
pub mod catalog;
pub mod network;
pub mod server;
pub mod tag;

use crate::client::ApiClient;
use crate::render::Renderer;

pub struct Context<'a> {
    pub client: &'a ApiClient,
    pub render: Renderer,
}

/// Query pairs for the filters that were given.
fn query(pairs: &[(&'static str, &Option<String>)]) -> Vec<(&'static str, String)> {
    pairs
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (*name, v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_absent_filters() {
        let dc = Some("NA9".to_string());
        let none = None;
        assert_eq!(
            query(&[("datacenterId", &dc), ("networkDomainId", &none)]),
            vec![("datacenterId", "NA9".to_string())]
        );
    }
}
