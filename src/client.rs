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

use crate::resolve::{FilterCriteria, ResourceRecord};
use crate::xml;
use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const API_VERSION: &str = "caas/2.4";
/// The older XML API, which still carries backups and classic networks.
pub const LEGACY_API_VERSION: &str = "oec/0.9";

const UA: &str = "didata/0.1";
const JSON: &str = "application/json";
const XML: &str = "application/xml";

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub body: String,
    pub json: Option<Value>,
}

/// A non-2xx answer from the API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl ApiError {
    /// Reads `responseCode`/`message` from a JSON error, or
    /// `Status.resultCode`/`Status.resultDetail` from a legacy XML one.
    fn from_response(status: u16, body: &str) -> Self {
        let parsed = parse_document(body);
        let field = |pointer: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.pointer(pointer))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let code = field("/responseCode").or_else(|| field("/Status/resultCode"));
        let message = field("/message")
            .or_else(|| field("/Status/resultDetail"))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status}")
                } else {
                    trimmed.to_string()
                }
            });
        ApiError::Status {
            status,
            code,
            message,
        }
    }
}

/// JSON bodies parse as JSON, bodies starting with `<` as XML.
fn parse_document(text: &str) -> Option<Value> {
    if text.trim_start().starts_with('<') {
        xml::to_value(text)
            .map_err(|err| tracing::debug!(error = %err, "response body is not well-formed XML"))
            .ok()
    } else {
        serde_json::from_str(text).ok()
    }
}

enum Payload {
    Json(Value),
    Xml(String),
}

#[derive(Debug)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    user: String,
    password: String,
    org_id: OnceCell<String>,
}

impl ApiClient {
    pub fn new(endpoint: &str, user: &str, password: &str) -> Result<Self> {
        let mut base = endpoint.trim_end_matches('/').to_string();
        base.push('/');
        let parsed = Url::parse(&base).context("parsing API endpoint")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static(UA))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            user: user.to_string(),
            password: password.to_string(),
            org_id: OnceCell::new(),
        })
    }

    /// Uses a known organization id instead of asking the API for it.
    pub fn with_org_id(self, org_id: Option<String>) -> Self {
        if let Some(id) = org_id.filter(|id| !id.trim().is_empty()) {
            let _ = self.org_id.set(id.trim().to_string());
        }
        self
    }

    /// The organization id all resource paths are scoped to. Looked up from
    /// `user/myUser` on first use when not configured.
    pub fn org_id(&self) -> Result<&str> {
        self.org_id
            .get_or_try_init(|| {
                let response = self
                    .request(
                        Method::GET,
                        &format!("{API_VERSION}/user/myUser"),
                        &[],
                        None,
                        JSON,
                    )
                    .context("looking up organization id")?;
                let id = response
                    .json
                    .as_ref()
                    .and_then(|v| v.pointer("/organization/id"))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("user/myUser response has no organization.id"))?
                    .to_string();
                tracing::info!(org_id = %id, "discovered organization id");
                Ok(id)
            })
            .map(String::as_str)
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ResponseData> {
        let path = self.org_path(API_VERSION, path)?;
        self.request(Method::GET, &path, query, None, JSON)
    }

    pub fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseData> {
        let path = self.org_path(API_VERSION, path)?;
        let body = serde_json::to_value(body).context("encoding request body")?;
        self.request(Method::POST, &path, &[], Some(Payload::Json(body)), JSON)
    }

    /// GET against the legacy XML API. `path` may carry a bare flag query
    /// such as `?disable`.
    pub fn legacy_get(&self, path: &str) -> Result<ResponseData> {
        let path = self.org_path(LEGACY_API_VERSION, path)?;
        self.request(Method::GET, &path, &[], None, XML)
    }

    pub fn legacy_post(&self, path: &str, document: String) -> Result<ResponseData> {
        let path = self.org_path(LEGACY_API_VERSION, path)?;
        self.request(Method::POST, &path, &[], Some(Payload::Xml(document)), XML)
    }

    /// Lists resources under `path`, keeping only the records found in the
    /// `item_key` array of the page.
    pub fn list_records(
        &self,
        path: &str,
        item_key: &str,
        criteria: &FilterCriteria,
    ) -> Result<Vec<ResourceRecord>> {
        let response = self.get(path, &criteria.usable())?;
        let items = response
            .json
            .as_ref()
            .and_then(|v| v.get(item_key))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(items).with_context(|| format!("decoding `{item_key}` listing"))
    }

    fn org_path(&self, version: &str, path: &str) -> Result<String> {
        let org = self.org_id()?;
        Ok(format!("{version}/{org}/{}", path.trim_start_matches('/')))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<Payload>,
        accept: &'static str,
    ) -> Result<ResponseData> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("joining path `{}` to base URL", path))?;
        tracing::debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, HeaderValue::from_static(accept))
            .header(USER_AGENT, HeaderValue::from_static(UA));

        if !query.is_empty() {
            request = request.query(query);
        }

        match payload {
            Some(Payload::Json(body)) => request = request.json(&body),
            Some(Payload::Xml(document)) => {
                request = request
                    .header(CONTENT_TYPE, HeaderValue::from_static(XML))
                    .body(document)
            }
            None => {}
        }

        let response = request.send().context("sending request")?;
        let status = response.status().as_u16();
        let text = response.text().context("reading response body")?;
        tracing::debug!(status, "received response");

        if !(200..300).contains(&status) {
            return Err(ApiError::from_response(status, &text).into());
        }

        let json = parse_document(&text);
        Ok(ResponseData { body: text, json })
    }
}
