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

mod client;
mod commands;
mod config;
mod flatten;
mod render;
mod resolve;
mod xml;

use crate::client::{ApiClient, ApiError};
use crate::commands::Context;
use crate::commands::backup::BackupCommand;
use crate::commands::catalog::{ImageCommand, LocationCommand};
use crate::commands::network::NetworkCommand;
use crate::commands::server::ServerCommand;
use crate::commands::tag::TagCommand;
use crate::config::{Config, ConfigError, Scope, save};
use crate::flatten::SequenceKeys;
use crate::render::{OutputFormat, Renderer};
use crate::resolve::ResolveError;
use anyhow::{Context as _, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "didata",
    version,
    about = "CLI for the Dimension Data CloudControl compute API"
)]
struct Cli {
    #[arg(long, global = true, env = "DIDATA_USER", help = "API user name")]
    user: Option<String>,

    #[arg(
        long,
        global = true,
        env = "DIDATA_PASSWORD",
        hide_env_values = true,
        help = "API password"
    )]
    password: Option<String>,

    #[arg(
        long,
        global = true,
        env = "DIDATA_REGION",
        help = "Region shorthand: na, eu, au, af, ap, ca, latam, in"
    )]
    region: Option<String>,

    #[arg(
        long,
        global = true,
        env = "DIDATA_ENDPOINT",
        value_name = "URL",
        help = "API endpoint (overrides --region; defaults to https://api-na.dimensiondata.com)"
    )]
    endpoint: Option<String>,

    #[arg(
        long,
        global = true,
        env = "DIDATA_ORG_ID",
        help = "Organization id (looked up from the API when omitted)"
    )]
    org_id: Option<String>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        global = true,
        help = "Output format"
    )]
    output: OutputFormat,

    #[arg(
        long,
        global = true,
        help = "Include array indices in flattened keys (disk.0.sizeGb) instead of merging elements"
    )]
    indexed_keys: bool,

    #[arg(long, short = 'v', global = true, help = "Log requests to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist the global connection flags (--user, --password, --region, ...) to a config file
    Configure {
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Server lifecycle
    #[command(subcommand)]
    Server(ServerCommand),
    /// Network domains, VLANs, firewall rules and classic networks
    #[command(subcommand)]
    Network(NetworkCommand),
    /// Cloud backup for servers
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Tag keys and tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// OS images
    #[command(subcommand)]
    Image(ImageCommand),
    /// Datacenters
    #[command(subcommand)]
    Location(LocationCommand),
    /// Show current configuration (password masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "didata=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let overrides = Config {
        user: cli.user,
        password: cli.password,
        region: cli.region,
        endpoint: cli.endpoint,
        org_id: cli.org_id,
    };

    match cli.command {
        Commands::Configure { scope } => {
            if overrides == Config::default() {
                return Err(anyhow!(
                    "Nothing to save; pass at least one of --user, --password, --region, --endpoint, --org-id"
                ));
            }
            if let Some(region) = overrides.region.as_deref() {
                config::endpoint_for(None, Some(region))?;
            }
            let existing = config::load_scope(scope.into(), &cwd)?;
            let path = save(scope.into(), &config::merge(existing, overrides), &cwd)?;
            println!("Saved configuration to {}", path.display());
            return Ok(());
        }
        Commands::ConfigShow => {
            let merged = config::merge(config::load(&cwd)?, overrides);
            println!("{}", serde_json::to_string_pretty(&config::masked(&merged))?);
            return Ok(());
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            let out = &mut std::io::stdout();
            match shell {
                CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin, out),
                CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, out),
                CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin, out),
                CompletionShell::PowerShell => generate(shells::PowerShell, &mut cmd, bin, out),
            }
            return Ok(());
        }
        _ => {}
    }

    let effective = config::resolve(&cwd, overrides)?;
    let client = ApiClient::new(&effective.endpoint, &effective.user, &effective.password)?
        .with_org_id(effective.org_id);
    let keys = if cli.indexed_keys {
        SequenceKeys::Indexed
    } else {
        SequenceKeys::Shared
    };
    let ctx = Context {
        client: &client,
        render: Renderer::new(cli.output, keys),
    };

    match cli.command {
        Commands::Server(cmd) => commands::server::handle(cmd, &ctx),
        Commands::Network(cmd) => commands::network::handle(cmd, &ctx),
        Commands::Backup(cmd) => commands::backup::handle(cmd, &ctx),
        Commands::Tag(cmd) => commands::tag::handle(cmd, &ctx),
        Commands::Image(cmd) => commands::catalog::handle_image(cmd, &ctx),
        Commands::Location(cmd) => commands::catalog::handle_location(cmd, &ctx),
        Commands::Configure { .. } | Commands::ConfigShow | Commands::Completion { .. } => {
            unreachable!("handled earlier")
        }
    }
}

fn find<'a, E: std::error::Error + 'static>(err: &'a anyhow::Error) -> Option<&'a E> {
    err.chain().find_map(|cause| cause.downcast_ref::<E>())
}

/// Exit status for a failed command. Resolution failures and config problems
/// get their own codes so scripts can tell them apart from API errors.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(resolve) = find::<ResolveError>(err) {
        return match resolve {
            ResolveError::NoFilterProvided => 3,
            ResolveError::NoResourcesFound => 4,
            ResolveError::AmbiguousFilter { .. } => 5,
            ResolveError::Transport { .. } => 1,
        };
    }
    if find::<ConfigError>(err).is_some() {
        return 6;
    }
    1
}

fn report(err: &anyhow::Error) {
    eprintln!("{}", format!("FAILURE: {err:#}").red().bold());
    if let Some(ResolveError::AmbiguousFilter { candidates }) = find::<ResolveError>(err) {
        for id in candidates {
            eprintln!("{id}");
        }
    }
    if let Some(ApiError::Status {
        status,
        code: Some(code),
        ..
    }) = find::<ApiError>(err)
    {
        eprintln!("Response code: {code} (HTTP {status})");
    }
}
