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

//! Read-only lookups: OS images and datacenters.

use super::{Context, query};
use crate::render::ListView;
use anyhow::Result;
use clap::Subcommand;

const IMAGE_VIEW: ListView = ListView {
    item_key: "osImage",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Description", "/description"),
        ("OS", "/operatingSystem/displayName"),
        ("Datacenter", "/datacenterId"),
    ],
};

const LOCATION_VIEW: ListView = ListView {
    item_key: "datacenter",
    headline: "displayName",
    fields: &[
        ("ID", "/id"),
        ("City", "/city"),
        ("State", "/state"),
        ("Country", "/country"),
        ("Type", "/type"),
    ],
};

#[derive(Subcommand)]
pub enum ImageCommand {
    /// List OS images
    List {
        #[arg(long, help = "Filter by datacenter id")]
        datacenter_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LocationCommand {
    /// List datacenters available to the organization
    List,
}

pub fn handle_image(cmd: ImageCommand, ctx: &Context) -> Result<()> {
    match cmd {
        ImageCommand::List { datacenter_id } => {
            let params = query(&[("datacenterId", &datacenter_id)]);
            let response = ctx.client.get("image/osImage", &params)?;
            ctx.render.listing(&response, &IMAGE_VIEW, false)
        }
    }
}

pub fn handle_location(cmd: LocationCommand, ctx: &Context) -> Result<()> {
    match cmd {
        LocationCommand::List => {
            let response = ctx.client.get("infrastructure/datacenter", &[])?;
            ctx.render.listing(&response, &LOCATION_VIEW, false)
        }
    }
}
