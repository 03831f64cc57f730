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

use super::{Context, query};
use crate::client::ApiClient;
use crate::render::ListView;
use crate::resolve::{FilterCriteria, resolve};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

const SERVER_VIEW: ListView = ListView {
    item_key: "server",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Datacenter", "/datacenterId"),
        ("OS", "/operatingSystem/displayName"),
        ("Private IPv4", "/networkInfo/primaryNic/privateIpv4"),
        ("IPv6", "/networkInfo/primaryNic/ipv6"),
        ("State", "/state"),
        ("Started", "/started"),
    ],
};

#[derive(Subcommand)]
pub enum ServerCommand {
    /// List servers (optionally filtered)
    List {
        #[command(flatten)]
        filters: ListFilters,
        #[arg(long, help = "Dump all attributes about each server")]
        dumpall: bool,
        #[arg(long, value_name = "N")]
        page_size: Option<u32>,
        #[arg(long, value_name = "N")]
        page_number: Option<u32>,
    },
    /// Show every attribute of a server
    Get {
        #[arg(value_name = "SERVER_ID")]
        id: String,
    },
    /// Deploy a new server
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "IMAGE_ID")]
        image_id: String,
        #[arg(long, help = "Start the server once deployed")]
        autostart: bool,
        #[arg(long, value_name = "PASSWORD")]
        admin_password: String,
        #[arg(long, value_name = "NETWORK_DOMAIN_ID")]
        network_domain_id: String,
        #[arg(long, value_name = "VLAN_ID")]
        vlan_id: String,
    },
    /// Power on a server
    Start(ServerTarget),
    /// Shut a server down gracefully
    Shutdown(ServerTarget),
    /// Power a server off
    ShutdownHard(ServerTarget),
    /// Reboot a server gracefully
    Reboot(ServerTarget),
    /// Hard reset a server
    RebootHard(ServerTarget),
    /// Delete a server
    Destroy(ServerTarget),
}

#[derive(Args, Debug, Default)]
pub struct ListFilters {
    #[arg(long, help = "Filter by server id")]
    id: Option<String>,
    #[arg(long, help = "Filter by datacenter id")]
    datacenter_id: Option<String>,
    #[arg(long, help = "Filter by network domain id")]
    network_domain_id: Option<String>,
    #[arg(long, help = "Filter by classic network id")]
    network_id: Option<String>,
    #[arg(long, help = "Filter by VLAN id")]
    vlan_id: Option<String>,
    #[arg(long, help = "Filter by source image id")]
    source_image_id: Option<String>,
    #[arg(long, help = "Filter by deployed state (true/false)")]
    deployed: Option<String>,
    #[arg(long, help = "Filter by server name")]
    name: Option<String>,
    #[arg(long, help = "Filter by creation time, e.g. 2015-05-01T12:00:00.000Z")]
    create_time: Option<String>,
    #[arg(long, help = "Filter by state, e.g. NORMAL")]
    state: Option<String>,
    #[arg(long, help = "Filter by started (true/false)")]
    started: Option<String>,
    #[arg(long, help = "Filter by operating system id, e.g. UBUNTU1464")]
    operating_system_id: Option<String>,
    #[arg(long, help = "Filter by IPv6 address")]
    ipv6: Option<String>,
    #[arg(long, help = "Filter by private IPv4 address")]
    private_ipv4: Option<String>,
}

/// Which server an action applies to: an explicit id, or filters that must
/// match exactly one server.
#[derive(Args, Debug, Default)]
pub struct ServerTarget {
    #[arg(long, value_name = "SERVER_ID")]
    server_id: Option<String>,
    #[arg(long, value_name = "IPV6", help = "Find the server by IPv6 address")]
    server_filter_ipv6: Option<String>,
    #[arg(long, value_name = "NAME", help = "Find the server by name")]
    server_filter_name: Option<String>,
    #[arg(long, value_name = "IPV4", help = "Find the server by private IPv4 address")]
    server_filter_private_ipv4: Option<String>,
}

impl ServerTarget {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .with("ipv6", self.server_filter_ipv6.clone())
            .with("name", self.server_filter_name.clone())
            .with("privateIpv4", self.server_filter_private_ipv4.clone())
    }

    pub fn server_id(&self, client: &ApiClient) -> Result<String> {
        if let Some(id) = self.server_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        let id = resolve(&self.criteria(), |criteria| {
            client.list_records("server/server", SERVER_VIEW.item_key, criteria)
        })?;
        tracing::debug!(server_id = %id, "resolved server from filters");
        Ok(id)
    }
}

pub fn handle(cmd: ServerCommand, ctx: &Context) -> Result<()> {
    let client = ctx.client;
    match cmd {
        ServerCommand::List {
            filters,
            dumpall,
            page_size,
            page_number,
        } => {
            let page_size = page_size.map(|n| n.to_string());
            let page_number = page_number.map(|n| n.to_string());
            let params = query(&[
                ("id", &filters.id),
                ("datacenterId", &filters.datacenter_id),
                ("networkDomainId", &filters.network_domain_id),
                ("networkId", &filters.network_id),
                ("vlanId", &filters.vlan_id),
                ("sourceImageId", &filters.source_image_id),
                ("deployed", &filters.deployed),
                ("name", &filters.name),
                ("createTime", &filters.create_time),
                ("state", &filters.state),
                ("started", &filters.started),
                ("operatingSystemId", &filters.operating_system_id),
                ("ipv6", &filters.ipv6),
                ("privateIpv4", &filters.private_ipv4),
                ("pageSize", &page_size),
                ("pageNumber", &page_number),
            ]);
            let response = client.get("server/server", &params)?;
            ctx.render.listing(&response, &SERVER_VIEW, dumpall)
        }
        ServerCommand::Get { id } => {
            let response = client.get(&format!("server/server/{id}"), &[])?;
            ctx.render.item(&response)
        }
        ServerCommand::Create {
            name,
            description,
            image_id,
            autostart,
            admin_password,
            network_domain_id,
            vlan_id,
        } => {
            let mut body = json!({
                "name": name,
                "imageId": image_id,
                "start": autostart,
                "administratorPassword": admin_password,
                "networkInfo": {
                    "networkDomainId": network_domain_id,
                    "primaryNic": { "vlanId": vlan_id }
                }
            });
            if let Some(description) = description {
                body["description"] = json!(description);
            }
            let response = client.post("server/deployServer", &body)?;
            ctx.render.action(&response)
        }
        ServerCommand::Start(target) => power(ctx, &target, "server/startServer"),
        ServerCommand::Shutdown(target) => power(ctx, &target, "server/shutdownServer"),
        ServerCommand::ShutdownHard(target) => power(ctx, &target, "server/powerOffServer"),
        ServerCommand::Reboot(target) => power(ctx, &target, "server/rebootServer"),
        ServerCommand::RebootHard(target) => power(ctx, &target, "server/resetServer"),
        ServerCommand::Destroy(target) => power(ctx, &target, "server/deleteServer"),
    }
}

fn power(ctx: &Context, target: &ServerTarget, path: &str) -> Result<()> {
    let id = target.server_id(ctx.client)?;
    let response = ctx.client.post(path, &json!({ "id": id }))?;
    ctx.render.action(&response)
}
