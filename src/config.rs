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

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api-na.dimensiondata.com";

const REGIONS: &[&str] = &["na", "eu", "au", "af", "ap", "ca", "latam", "in"];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "user and password are required; pass --user/--password, set DIDATA_USER/DIDATA_PASSWORD or run `didata configure`"
    )]
    MissingCredentials,
    #[error("unknown region `{0}` (expected one of: na, eu, au, af, ap, ca, latam, in)")]
    UnknownRegion(String),
}

#[derive(Debug)]
pub struct EffectiveConfig {
    pub user: String,
    pub password: String,
    pub endpoint: String,
    pub org_id: Option<String>,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".didata.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("DIDATA_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("didata").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Merges the config files under `overrides` (flags and environment) and
/// checks that credentials are present.
pub fn resolve(cwd: &Path, overrides: Config) -> Result<EffectiveConfig> {
    let merged = merge(load(cwd)?, overrides);

    let user = non_blank(merged.user).ok_or(ConfigError::MissingCredentials)?;
    let password = non_blank(merged.password).ok_or(ConfigError::MissingCredentials)?;
    let endpoint = endpoint_for(merged.endpoint.as_deref(), merged.region.as_deref())?;

    Ok(EffectiveConfig {
        user,
        password,
        endpoint,
        org_id: non_blank(merged.org_id),
    })
}

/// `endpoint` wins over `region`; neither means the North America endpoint.
pub fn endpoint_for(endpoint: Option<&str>, region: Option<&str>) -> Result<String, ConfigError> {
    if let Some(url) = endpoint.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    match region.map(|r| r.trim().to_ascii_lowercase()) {
        None => Ok(DEFAULT_ENDPOINT.to_string()),
        Some(r) if REGIONS.contains(&r.as_str()) => Ok(format!("https://api-{r}.dimensiondata.com")),
        Some(r) => Err(ConfigError::UnknownRegion(r)),
    }
}

/// The merged config with secrets replaced, for display.
pub fn masked(config: &Config) -> Config {
    let mut masked = config.clone();
    if masked.password.is_some() {
        masked.password = Some("*****".into());
    }
    masked
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

/// Fields set in `over` replace those in `base`.
pub fn merge(base: Config, over: Config) -> Config {
    Config {
        user: over.user.or(base.user),
        password: over.password.or(base.password),
        region: over.region.or(base.region),
        endpoint: over.endpoint.or(base.endpoint),
        org_id: over.org_id.or(base.org_id),
    }
}
