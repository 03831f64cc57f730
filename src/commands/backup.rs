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

//! Cloud backup for servers. Only the legacy XML API exposes it, so every
//! call here goes through `legacy_get`/`legacy_post`.

use super::Context;
use super::server::ServerTarget;
use crate::render::{ListView, OutputFormat, listed_items, value_to_str};
use crate::xml::{BACKUP_NS, text_element};
use anyhow::{Result, anyhow};
use clap::{Subcommand, ValueEnum};
use serde_json::Value;

const CLIENT_TYPE_VIEW: ListView = ListView {
    item_key: "/BackupClientTypes/backupClientType",
    headline: "type",
    fields: &[
        ("Description", "/description"),
        ("File System", "/isFileSystem"),
    ],
};

const STORAGE_POLICY_VIEW: ListView = ListView {
    item_key: "/BackupStoragePolicies/backupStoragePolicy",
    headline: "name",
    fields: &[
        ("Retention Days", "/retentionPeriodInDays"),
        ("Secondary Location", "/secondaryLocation"),
    ],
};

const SCHEDULE_POLICY_VIEW: ListView = ListView {
    item_key: "/BackupSchedulePolicies/backupSchedulePolicy",
    headline: "name",
    fields: &[("Description", "/description")],
};

const CLIENTS: &str = "/BackupDetails/backupClient";

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackupPlan {
    Essentials,
    Advanced,
    Enterprise,
}

impl BackupPlan {
    fn as_api(self) -> &'static str {
        match self {
            BackupPlan::Essentials => "Essentials",
            BackupPlan::Advanced => "Advanced",
            BackupPlan::Enterprise => "Enterprise",
        }
    }
}

/// When a backup client sends its notification mail.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AlertTrigger {
    Failure,
    Success,
    Both,
}

impl AlertTrigger {
    fn as_api(self) -> &'static str {
        match self {
            AlertTrigger::Failure => "ON_FAILURE",
            AlertTrigger::Success => "ON_SUCCESS",
            AlertTrigger::Both => "ON_SUCCESS_OR_FAILURE",
        }
    }
}

#[derive(Subcommand)]
pub enum BackupCommand {
    /// Enable backups for a server
    Enable {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
        #[arg(long, value_enum, default_value_t = BackupPlan::Essentials)]
        service_plan: BackupPlan,
    },
    /// Disable backups for a server
    Disable {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
    },
    /// Show the backup details of a server
    Info {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
    },
    /// List the backup client types available to a server, e.g. FA.Linux
    ListClientTypes {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
    },
    /// List the storage policies available to a server, e.g. 14 Day Storage Policy
    ListStoragePolicies {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
    },
    /// List the schedule policies available to a server, e.g. 12AM - 6AM
    ListSchedulePolicies {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
    },
    /// Add a backup client to a server
    AddClient {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
        #[arg(long, value_name = "TYPE")]
        client_type: String,
        #[arg(long, value_name = "NAME")]
        storage_policy: String,
        #[arg(long, value_name = "NAME")]
        schedule_policy: String,
        #[arg(long, value_enum, requires = "notify_email")]
        trigger_on: Option<AlertTrigger>,
        #[arg(long, value_name = "EMAIL")]
        notify_email: Option<String>,
    },
    /// Remove a backup client from a server
    RemoveClient {
        #[arg(long, value_name = "SERVER_ID")]
        server_id: String,
        #[arg(long, value_name = "CLIENT_ID")]
        client_id: String,
    },
    /// Print the client download URL for a server's backup clients
    DownloadUrl(ServerTarget),
}

pub fn handle(cmd: BackupCommand, ctx: &Context) -> Result<()> {
    let client = ctx.client;
    match cmd {
        BackupCommand::Enable {
            server_id,
            service_plan,
        } => {
            let document = format!(
                r#"<NewBackup xmlns="{BACKUP_NS}" servicePlan="{}"/>"#,
                service_plan.as_api()
            );
            let response = client.legacy_post(&format!("server/{server_id}/backup"), document)?;
            ctx.render.action(&response)
        }
        BackupCommand::Disable { server_id } => {
            let response = client.legacy_get(&format!("server/{server_id}/backup?disable"))?;
            ctx.render.action(&response)
        }
        BackupCommand::Info { server_id } => {
            let response = client.legacy_get(&format!("server/{server_id}/backup"))?;
            ctx.render.item(&response)
        }
        BackupCommand::ListClientTypes { server_id } => {
            let response =
                client.legacy_get(&format!("server/{server_id}/backup/client/type"))?;
            ctx.render.listing(&response, &CLIENT_TYPE_VIEW, false)
        }
        BackupCommand::ListStoragePolicies { server_id } => {
            let response =
                client.legacy_get(&format!("server/{server_id}/backup/client/storagePolicy"))?;
            ctx.render.listing(&response, &STORAGE_POLICY_VIEW, false)
        }
        BackupCommand::ListSchedulePolicies { server_id } => {
            let response =
                client.legacy_get(&format!("server/{server_id}/backup/client/schedulePolicy"))?;
            ctx.render.listing(&response, &SCHEDULE_POLICY_VIEW, false)
        }
        BackupCommand::AddClient {
            server_id,
            client_type,
            storage_policy,
            schedule_policy,
            trigger_on,
            notify_email,
        } => {
            let document = add_client_document(
                &client_type,
                &storage_policy,
                &schedule_policy,
                trigger_on,
                notify_email.as_deref(),
            );
            let response =
                client.legacy_post(&format!("server/{server_id}/backup/client"), document)?;
            ctx.render.action(&response)
        }
        BackupCommand::RemoveClient {
            server_id,
            client_id,
        } => {
            let response = client.legacy_get(&format!(
                "server/{server_id}/backup/client/{client_id}?remove"
            ))?;
            ctx.render.action(&response)
        }
        BackupCommand::DownloadUrl(target) => {
            let server_id = target.server_id(client)?;
            let response = client.legacy_get(&format!("server/{server_id}/backup"))?;
            let urls = response
                .json
                .as_ref()
                .map(download_urls)
                .unwrap_or_default();
            if urls.is_empty() {
                return Err(anyhow!("no backup clients are configured for server {server_id}"));
            }
            match ctx.render.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&urls)?),
                OutputFormat::Pretty => {
                    for url in urls {
                        println!("{url}");
                    }
                }
            }
            Ok(())
        }
    }
}

fn add_client_document(
    client_type: &str,
    storage_policy: &str,
    schedule_policy: &str,
    trigger: Option<AlertTrigger>,
    email: Option<&str>,
) -> String {
    let alerting = match email {
        Some(email) => format!(
            r#"<alerting trigger="{}">{}</alerting>"#,
            trigger.unwrap_or(AlertTrigger::Failure).as_api(),
            text_element("emailAddress", Some(email))
        ),
        None => String::new(),
    };
    format!(
        r#"<AddBackupClient xmlns="{BACKUP_NS}">{}{}{}{alerting}</AddBackupClient>"#,
        text_element("type", Some(client_type)),
        text_element("storagePolicyName", Some(storage_policy)),
        text_element("schedulePolicyName", Some(schedule_policy)),
    )
}

/// Download URLs of every backup client in a backup details document.
fn download_urls(details: &Value) -> Vec<String> {
    listed_items(details, CLIENTS)
        .into_iter()
        .filter_map(|client| client.get("downloadUrl"))
        .map(value_to_str)
        .filter(|url| !url.trim().is_empty())
        .collect()
}
