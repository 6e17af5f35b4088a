// Kubo RPC API client
//
// Request/response shaping over the node's HTTP RPC (`/api/v0`). Kubo
// expects POST for every endpoint and answers with small JSON bodies.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::cid::Cid;
use crate::config::ClientConfig;
use crate::errors::ApiError;

/// Options for `pin/ls`.
#[derive(Debug, Clone)]
pub struct PinLsOptions {
    /// Pin type filter: "direct", "indirect", "recursive", or "all".
    pub pin_type: String,
    /// Include pin names in the listing.
    pub names: bool,
}

impl Default for PinLsOptions {
    fn default() -> Self {
        Self {
            pin_type: "recursive".to_string(),
            names: false,
        }
    }
}

/// Options for `add`.
#[derive(Debug, Clone)]
pub struct AddOptions {
    pub cid_version: u8,
    pub pin: bool,
    /// Chunker spec, e.g. "size-262144".
    pub chunker: Option<String>,
    /// MFS path to copy the added file to (`to-files`).
    pub to_files: Option<String>,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            cid_version: 1,
            pin: true,
            chunker: None,
            to_files: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinLsResponse {
    #[serde(rename = "Keys", default)]
    keys: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PinAddResponse {
    #[serde(rename = "Pins", default)]
    pins: Vec<String>,
}

/// HTTP client for the node's RPC API.
pub struct NodeApi {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl NodeApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.api_url(), config.request_timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Identity/heartbeat request. Used as the daemon health check.
    pub async fn id(&self) -> Result<Value, ApiError> {
        let url = format!("{}/id", self.base_url);
        debug!(url = %url, "Requesting node identity");

        let response = self.http.post(&url).send().await.map_err(ApiError::Http)?;
        let response = Self::check_status(response).await?;
        response.json().await.map_err(ApiError::Http)
    }

    /// Pin a CID on the node.
    pub async fn pin_add(&self, cid: &Cid) -> Result<(), ApiError> {
        let url = format!("{}/pin/add", self.base_url);
        debug!(cid = %cid, "Pinning content");

        let response = self
            .http
            .post(&url)
            .query(&[("arg", cid.as_str())])
            .send()
            .await
            .map_err(ApiError::Http)?;
        let response = Self::check_status(response).await?;

        // The node answers with the resolved root CID(s) it pinned; an
        // empty array means nothing was pinned.
        let body: PinAddResponse = response.json().await.map_err(ApiError::Http)?;
        if body.pins.is_empty() {
            return Err(ApiError::Malformed { field: "Pins" });
        }
        Ok(())
    }

    /// List pinned CIDs. An empty pin set is an empty vec, not an error.
    pub async fn pin_ls(&self, opts: &PinLsOptions) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/pin/ls", self.base_url);
        debug!(pin_type = %opts.pin_type, "Listing pins");

        let response = self
            .http
            .post(&url)
            .query(&[
                ("type", opts.pin_type.as_str()),
                ("names", if opts.names { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(ApiError::Http)?;
        let response = Self::check_status(response).await?;

        let body: PinLsResponse = response.json().await.map_err(ApiError::Http)?;
        let mut cids: Vec<String> = body
            .keys
            .unwrap_or_default()
            .into_keys()
            .collect();
        cids.sort();
        Ok(cids)
    }

    /// Add a local file to the node, returning its CID.
    pub async fn add_file(&self, path: &Path, opts: &AddOptions) -> Result<Cid, ApiError> {
        let data = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        self.add_bytes(data, &file_name, opts).await
    }

    /// Add in-memory bytes to the node, returning the resulting CID.
    pub async fn add_bytes(
        &self,
        data: Vec<u8>,
        file_name: &str,
        opts: &AddOptions,
    ) -> Result<Cid, ApiError> {
        let url = format!("{}/add", self.base_url);
        debug!(file = %file_name, bytes = data.len(), "Adding content to node");

        let mut query: Vec<(&str, String)> = vec![
            ("cid-version", opts.cid_version.to_string()),
            ("pin", opts.pin.to_string()),
        ];
        if let Some(chunker) = &opts.chunker {
            query.push(("chunker", chunker.clone()));
        }
        if let Some(to_files) = &opts.to_files {
            query.push(("to-files", to_files.clone()));
        }

        let part = multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .query(&query)
            .multipart(form)
            // Uploads may outlast the control-plane bound; scale it.
            .timeout(self.timeout * 6)
            .send()
            .await
            .map_err(ApiError::Http)?;
        let response = Self::check_status(response).await?;

        // Kubo streams NDJSON progress events; the final line carries the
        // root hash.
        let text = response.text().await.map_err(ApiError::Http)?;
        let hash = text
            .lines()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .find_map(|line| {
                serde_json::from_str::<AddResponse>(line)
                    .ok()
                    .and_then(|r| r.hash)
            })
            .ok_or(ApiError::Malformed { field: "Hash" })?;

        Ok(Cid::new(hash))
    }

    /// Ask the node to shut itself down.
    pub async fn shutdown(&self) -> Result<(), ApiError> {
        let url = format!("{}/shutdown", self.base_url);
        debug!(url = %url, "Requesting node shutdown");

        let response = self.http.post(&url).send().await.map_err(ApiError::Http)?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Copy content into the node's mutable files namespace.
    pub async fn files_cp(&self, source: &str, dest: &str) -> Result<(), ApiError> {
        let url = format!("{}/files/cp", self.base_url);
        debug!(source = %source, dest = %dest, "Copying into files API");

        let response = self
            .http
            .post(&url)
            .query(&[("arg", source), ("arg", dest)])
            .send()
            .await
            .map_err(ApiError::Http)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}
