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
use crate::render::ListView;
use crate::xml::{NETWORK_NS, text_element};
use anyhow::{Context as _, Result, anyhow};
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{Value, json};

const NETWORK_DOMAIN_VIEW: ListView = ListView {
    item_key: "networkDomain",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Description", "/description"),
        ("Plan", "/type"),
        ("Location", "/datacenterId"),
        ("Status", "/state"),
    ],
};

const VLAN_VIEW: ListView = ListView {
    item_key: "vlan",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Description", "/description"),
        ("Network Domain", "/networkDomain/id"),
        ("IPv4 Range", "/privateIpv4Range/address"),
        ("IPv4 Prefix", "/privateIpv4Range/prefixSize"),
        ("IPv6 Range", "/ipv6Range/address"),
        ("IPv6 Prefix", "/ipv6Range/prefixSize"),
        ("Status", "/state"),
    ],
};

const FIREWALL_RULE_VIEW: ListView = ListView {
    item_key: "firewallRule",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Action", "/action"),
        ("IP Version", "/ipVersion"),
        ("Protocol", "/protocol"),
        ("Source IP", "/source/ip/address"),
        ("Source Port", "/source/port/begin"),
        ("Destination IP", "/destination/ip/address"),
        ("Destination Port", "/destination/port/begin"),
        ("Enabled", "/enabled"),
        ("Status", "/state"),
    ],
};

const CLASSIC_NETWORK_VIEW: ListView = ListView {
    item_key: "/NetworkWithLocations/network",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Description", "/description"),
        ("PrivateNet", "/privateNet"),
        ("Location", "/location"),
        ("Multicast", "/multicast"),
    ],
};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ServicePlan {
    Essentials,
    Advanced,
}

impl ServicePlan {
    fn as_api(self) -> &'static str {
        match self {
            ServicePlan::Essentials => "ESSENTIALS",
            ServicePlan::Advanced => "ADVANCED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RuleAction {
    Accept,
    Drop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum IpVersion {
    Ipv4,
    Ipv6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Ip,
    Icmp,
    Tcp,
    Udp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Position {
    First,
    Last,
    Before,
    After,
}

impl RuleAction {
    fn as_api(self) -> &'static str {
        match self {
            RuleAction::Accept => "ACCEPT_DECISIVELY",
            RuleAction::Drop => "DROP",
        }
    }
}

impl IpVersion {
    fn as_api(self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "IPV4",
            IpVersion::Ipv6 => "IPV6",
        }
    }
}

impl Protocol {
    fn as_api(self) -> &'static str {
        match self {
            Protocol::Ip => "IP",
            Protocol::Icmp => "ICMP",
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl Position {
    fn as_api(self) -> &'static str {
        match self {
            Position::First => "FIRST",
            Position::Last => "LAST",
            Position::Before => "BEFORE",
            Position::After => "AFTER",
        }
    }
}

/// Everything a new firewall rule needs, as given on the command line.
#[derive(Args, Debug)]
pub struct FirewallRuleArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_name = "NETWORK_DOMAIN_ID")]
    network_domain_id: String,
    #[arg(long, value_enum, default_value_t = IpVersion::Ipv4)]
    ip_version: IpVersion,
    #[arg(long, value_enum)]
    action: RuleAction,
    #[arg(long, value_enum)]
    protocol: Protocol,
    #[arg(long = "source-ip", value_name = "IP", default_value = "ANY")]
    source_ip: String,
    #[arg(long, value_name = "N")]
    source_prefix_size: Option<u8>,
    #[arg(long, value_name = "PORT", help = "First source port, or ANY")]
    source_start_port: Option<String>,
    #[arg(long, value_name = "PORT")]
    source_end_port: Option<String>,
    #[arg(long = "destination-ip", value_name = "IP", default_value = "ANY")]
    destination_ip: String,
    #[arg(long, value_name = "N")]
    destination_prefix_size: Option<u8>,
    #[arg(long, value_name = "PORT", help = "First destination port, or ANY")]
    destination_start_port: Option<String>,
    #[arg(long, value_name = "PORT")]
    destination_end_port: Option<String>,
    #[arg(long, value_enum, default_value_t = Position::Last)]
    position: Position,
    #[arg(long, value_name = "RULE_NAME", help = "Rule to place this one before or after")]
    relative_to_rule: Option<String>,
    #[arg(long, help = "Create the rule disabled")]
    disabled: bool,
}

#[derive(Subcommand)]
pub enum NetworkCommand {
    /// List network domains
    ListNetworkDomains {
        #[arg(long, help = "Filter by datacenter id")]
        datacenter_id: Option<String>,
    },
    /// Deploy a network domain
    CreateNetworkDomain {
        #[arg(long, help = "Datacenter to deploy into, e.g. NA9")]
        datacenter_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        service_plan: ServicePlan,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a network domain
    DeleteNetworkDomain {
        #[arg(long, value_name = "NETWORK_DOMAIN_ID")]
        network_domain_id: String,
    },
    /// List VLANs
    ListVlans {
        #[arg(long, help = "Filter by datacenter id")]
        datacenter_id: Option<String>,
        #[arg(long, help = "Filter by network domain id")]
        network_domain_id: Option<String>,
    },
    /// Deploy a VLAN into a network domain
    CreateVlan {
        #[arg(long, value_name = "NETWORK_DOMAIN_ID")]
        network_domain_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_name = "IPV4", help = "Private IPv4 base address, e.g. 10.0.3.0")]
        base_ipv4_address: String,
        #[arg(long, default_value_t = 24)]
        prefix_size: u8,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a VLAN
    DeleteVlan {
        #[arg(long, value_name = "VLAN_ID")]
        vlan_id: String,
    },
    /// List the firewall rules of a network domain
    ListFirewallRules {
        #[arg(long, value_name = "NETWORK_DOMAIN_ID")]
        network_domain_id: String,
    },
    /// Add a firewall rule to a network domain
    CreateFirewallRule(FirewallRuleArgs),
    /// Delete a firewall rule
    DeleteFirewallRule {
        #[arg(long, value_name = "RULE_ID")]
        rule_id: String,
    },
    /// List classic (pre network domain) networks
    ListNetworks {
        #[arg(long, help = "Filter by datacenter id")]
        datacenter_id: Option<String>,
    },
    /// Create a classic network
    CreateNetwork {
        #[arg(long, help = "Datacenter to create the network in, e.g. NA1")]
        datacenter_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a classic network
    DeleteNetwork {
        #[arg(long, value_name = "NETWORK_ID")]
        network_id: String,
    },
}

pub fn handle(cmd: NetworkCommand, ctx: &Context) -> Result<()> {
    let client = ctx.client;
    match cmd {
        NetworkCommand::ListNetworkDomains { datacenter_id } => {
            let params = query(&[("datacenterId", &datacenter_id)]);
            let response = client.get("network/networkDomain", &params)?;
            ctx.render.listing(&response, &NETWORK_DOMAIN_VIEW, false)
        }
        NetworkCommand::CreateNetworkDomain {
            datacenter_id,
            name,
            service_plan,
            description,
        } => {
            let mut body = json!({
                "datacenterId": datacenter_id,
                "name": name,
                "type": service_plan.as_api(),
            });
            if let Some(description) = description {
                body["description"] = json!(description);
            }
            let response = client.post("network/deployNetworkDomain", &body)?;
            ctx.render.action(&response)
        }
        NetworkCommand::DeleteNetworkDomain { network_domain_id } => {
            let response = client.post(
                "network/deleteNetworkDomain",
                &json!({ "id": network_domain_id }),
            )?;
            ctx.render.action(&response)
        }
        NetworkCommand::ListVlans {
            datacenter_id,
            network_domain_id,
        } => {
            let params = query(&[
                ("datacenterId", &datacenter_id),
                ("networkDomainId", &network_domain_id),
            ]);
            let response = client.get("network/vlan", &params)?;
            ctx.render.listing(&response, &VLAN_VIEW, false)
        }
        NetworkCommand::CreateVlan {
            network_domain_id,
            name,
            base_ipv4_address,
            prefix_size,
            description,
        } => {
            let mut body = json!({
                "networkDomainId": network_domain_id,
                "name": name,
                "privateIpv4BaseAddress": base_ipv4_address,
                "privateIpv4PrefixSize": prefix_size,
            });
            if let Some(description) = description {
                body["description"] = json!(description);
            }
            let response = client.post("network/deployVlan", &body)?;
            ctx.render.action(&response)
        }
        NetworkCommand::DeleteVlan { vlan_id } => {
            let response = client.post("network/deleteVlan", &json!({ "id": vlan_id }))?;
            ctx.render.action(&response)
        }
        NetworkCommand::ListFirewallRules { network_domain_id } => {
            let params = [("networkDomainId", network_domain_id)];
            let response = client.get("network/firewallRule", &params)?;
            ctx.render.listing(&response, &FIREWALL_RULE_VIEW, false)
        }
        NetworkCommand::CreateFirewallRule(args) => {
            let body = firewall_rule_body(&args)?;
            let response = client.post("network/createFirewallRule", &body)?;
            ctx.render.action(&response)
        }
        NetworkCommand::DeleteFirewallRule { rule_id } => {
            let response =
                client.post("network/deleteFirewallRule", &json!({ "id": rule_id }))?;
            ctx.render.action(&response)
        }
        NetworkCommand::ListNetworks { datacenter_id } => {
            let path = match datacenter_id {
                Some(dc) => format!("networkWithLocation/{dc}"),
                None => "networkWithLocation".to_string(),
            };
            let response = client.legacy_get(&path)?;
            ctx.render.listing(&response, &CLASSIC_NETWORK_VIEW, false)
        }
        NetworkCommand::CreateNetwork {
            datacenter_id,
            name,
            description,
        } => {
            let document = classic_network_document(&name, description.as_deref(), &datacenter_id);
            let response = client.legacy_post("networkWithLocation", document)?;
            ctx.render.action(&response)
        }
        NetworkCommand::DeleteNetwork { network_id } => {
            let response = client.legacy_get(&format!("network/{network_id}?delete"))?;
            ctx.render.action(&response)
        }
    }
}

fn firewall_rule_body(args: &FirewallRuleArgs) -> Result<Value> {
    let mut placement = json!({ "position": args.position.as_api() });
    match (args.position, &args.relative_to_rule) {
        (Position::Before | Position::After, Some(rule)) => {
            placement["relativeToRule"] = json!(rule);
        }
        (Position::Before | Position::After, None) => {
            return Err(anyhow!(
                "--position {} needs --relative-to-rule",
                args.position.as_api().to_lowercase()
            ));
        }
        (Position::First | Position::Last, _) => {}
    }

    let source = rule_endpoint(
        &args.source_ip,
        args.source_prefix_size,
        args.source_start_port.as_deref(),
        args.source_end_port.as_deref(),
    )
    .context("source")?;
    let destination = rule_endpoint(
        &args.destination_ip,
        args.destination_prefix_size,
        args.destination_start_port.as_deref(),
        args.destination_end_port.as_deref(),
    )
    .context("destination")?;

    Ok(json!({
        "networkDomainId": args.network_domain_id,
        "name": args.name,
        "action": args.action.as_api(),
        "ipVersion": args.ip_version.as_api(),
        "protocol": args.protocol.as_api(),
        "source": source,
        "destination": destination,
        "enabled": !args.disabled,
        "placement": placement,
    }))
}

/// One side of a rule. `ANY` as the address or start port leaves that part
/// unrestricted.
fn rule_endpoint(
    address: &str,
    prefix_size: Option<u8>,
    start_port: Option<&str>,
    end_port: Option<&str>,
) -> Result<Value> {
    let any = |v: &str| v.trim().eq_ignore_ascii_case("ANY");

    let unrestricted = any(address);
    let address = if unrestricted { "ANY" } else { address.trim() };
    let mut ip = json!({ "address": address });
    if let Some(prefix) = prefix_size.filter(|_| !unrestricted) {
        ip["prefixSize"] = json!(prefix);
    }
    let mut endpoint = json!({ "ip": ip });

    match start_port.filter(|p| !any(p)) {
        Some(begin) => {
            let mut port = json!({ "begin": parse_port(begin)? });
            if let Some(end) = end_port {
                port["end"] = json!(parse_port(end)?);
            }
            endpoint["port"] = port;
        }
        None if end_port.is_some() => {
            return Err(anyhow!("an end port needs a start port"));
        }
        None => {}
    }
    Ok(endpoint)
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .with_context(|| format!("`{raw}` is not a port number"))
}

fn classic_network_document(name: &str, description: Option<&str>, location: &str) -> String {
    format!(
        r#"<NewNetworkWithLocation xmlns="{NETWORK_NS}">{}{}{}</NewNetworkWithLocation>"#,
        text_element("name", Some(name)),
        text_element("description", description),
        text_element("location", Some(location)),
    )
}
