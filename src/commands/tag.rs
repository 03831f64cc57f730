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
use anyhow::{Result, anyhow};
use clap::{Subcommand, ValueEnum};
use serde_json::{Map, Value, json};

const TAG_KEY_VIEW: ListView = ListView {
    item_key: "tagKey",
    headline: "name",
    fields: &[
        ("ID", "/id"),
        ("Description", "/description"),
        ("Value Required", "/valueRequired"),
        ("Display On Report", "/displayOnReport"),
    ],
};

const TAG_VIEW: ListView = ListView {
    item_key: "tag",
    headline: "tagKeyName",
    fields: &[
        ("Value", "/value"),
        ("Asset", "/assetId"),
        ("Asset Type", "/assetType"),
        ("Asset Name", "/assetName"),
        ("Datacenter", "/datacenterId"),
    ],
};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AssetType {
    Server,
    NetworkDomain,
    Vlan,
    CustomerImage,
    PublicIpBlock,
    Account,
}

impl AssetType {
    fn as_api(self) -> &'static str {
        match self {
            AssetType::Server => "SERVER",
            AssetType::NetworkDomain => "NETWORK_DOMAIN",
            AssetType::Vlan => "VLAN",
            AssetType::CustomerImage => "CUSTOMER_IMAGE",
            AssetType::PublicIpBlock => "PUBLIC_IP_BLOCK",
            AssetType::Account => "ACCOUNT",
        }
    }
}

/// `KEY` or `KEY=VALUE` from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssignment {
    pub key: String,
    pub value: Option<String>,
}

fn parse_tag(raw: &str) -> Result<TagAssignment, String> {
    let (key, value) = match raw.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.to_string())),
        None => (raw.trim(), None),
    };
    if key.is_empty() {
        return Err(format!("tag `{raw}` has an empty key"));
    }
    Ok(TagAssignment {
        key: key.to_string(),
        value,
    })
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Create a tag key
    CreateKey {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, help = "Require a value whenever the key is applied")]
        value_required: bool,
        #[arg(long, help = "Include the key in usage reports")]
        display_on_report: bool,
    },
    /// Modify a tag key
    ModifyKey {
        #[arg(long, value_name = "TAG_KEY_ID")]
        tag_key_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        value_required: Option<bool>,
        #[arg(long)]
        display_on_report: Option<bool>,
    },
    /// Remove a tag key
    RemoveKey {
        #[arg(long, value_name = "TAG_KEY_ID")]
        tag_key_id: String,
    },
    /// List tag keys
    ListKeys {
        #[arg(long, help = "Filter by key name")]
        name: Option<String>,
    },
    /// Apply tags to an asset
    Apply {
        #[arg(long, value_enum)]
        asset_type: AssetType,
        #[arg(long, value_name = "ASSET_ID")]
        asset_id: String,
        #[arg(
            long = "tag",
            value_name = "KEY[=VALUE]",
            required = true,
            value_parser = parse_tag
        )]
        tags: Vec<TagAssignment>,
    },
    /// Remove tags from an asset
    Remove {
        #[arg(long, value_enum)]
        asset_type: AssetType,
        #[arg(long, value_name = "ASSET_ID")]
        asset_id: String,
        #[arg(long = "tag-key-name", value_name = "KEY", required = true)]
        tag_key_names: Vec<String>,
    },
    /// List applied tags
    List {
        #[arg(long, value_name = "ASSET_ID")]
        asset_id: Option<String>,
        #[arg(long, value_enum)]
        asset_type: Option<AssetType>,
        #[arg(long, value_name = "KEY")]
        tag_key_name: Option<String>,
    },
}

pub fn handle(cmd: TagCommand, ctx: &Context) -> Result<()> {
    let client = ctx.client;
    match cmd {
        TagCommand::CreateKey {
            name,
            description,
            value_required,
            display_on_report,
        } => {
            let mut body = json!({
                "name": name,
                "valueRequired": value_required,
                "displayOnReport": display_on_report,
            });
            if let Some(description) = description {
                body["description"] = json!(description);
            }
            let response = client.post("tag/createTagKey", &body)?;
            ctx.render.action(&response)
        }
        TagCommand::ModifyKey {
            tag_key_id,
            name,
            description,
            value_required,
            display_on_report,
        } => {
            let mut payload = Map::new();
            if let Some(name) = name {
                payload.insert("name".into(), json!(name));
            }
            if let Some(description) = description {
                payload.insert("description".into(), json!(description));
            }
            if let Some(required) = value_required {
                payload.insert("valueRequired".into(), json!(required));
            }
            if let Some(display) = display_on_report {
                payload.insert("displayOnReport".into(), json!(display));
            }
            if payload.is_empty() {
                return Err(anyhow!("Provide at least one field to update"));
            }
            payload.insert("id".into(), json!(tag_key_id));
            let response = client.post("tag/editTagKey", &Value::Object(payload))?;
            ctx.render.action(&response)
        }
        TagCommand::RemoveKey { tag_key_id } => {
            let response = client.post("tag/deleteTagKey", &json!({ "id": tag_key_id }))?;
            ctx.render.action(&response)
        }
        TagCommand::ListKeys { name } => {
            let response = client.get("tag/tagKey", &query(&[("name", &name)]))?;
            ctx.render.listing(&response, &TAG_KEY_VIEW, false)
        }
        TagCommand::Apply {
            asset_type,
            asset_id,
            tags,
        } => {
            let response = client.post("tag/applyTags", &apply_body(asset_type, &asset_id, &tags))?;
            ctx.render.action(&response)
        }
        TagCommand::Remove {
            asset_type,
            asset_id,
            tag_key_names,
        } => {
            let body = json!({
                "assetType": asset_type.as_api(),
                "assetId": asset_id,
                "tagKeyName": tag_key_names,
            });
            let response = client.post("tag/removeTags", &body)?;
            ctx.render.action(&response)
        }
        TagCommand::List {
            asset_id,
            asset_type,
            tag_key_name,
        } => {
            let asset_type = asset_type.map(|t| t.as_api().to_string());
            let params = query(&[
                ("assetId", &asset_id),
                ("assetType", &asset_type),
                ("tagKeyName", &tag_key_name),
            ]);
            let response = client.get("tag/tag", &params)?;
            ctx.render.listing(&response, &TAG_VIEW, false)
        }
    }
}

fn apply_body(asset_type: AssetType, asset_id: &str, tags: &[TagAssignment]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|tag| match &tag.value {
            Some(value) => json!({ "tagKeyName": tag.key, "value": value }),
            None => json!({ "tagKeyName": tag.key }),
        })
        .collect();
    json!({
        "assetType": asset_type.as_api(),
        "assetId": asset_id,
        "tag": tags,
    })
}
