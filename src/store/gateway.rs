// HTTP gateway content store
//
// Reads content through the node's HTTP gateway (`/ipfs/<cid>`). The
// gateway address comes from explicit configuration, never from
// process-wide environment state.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::StatusCode;
use tracing::debug;

use super::{ByteStream, ContentStore};
use crate::cid::Cid;
use crate::config::ClientConfig;
use crate::errors::FetchError;

pub struct GatewayStore {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayStore {
    /// Build a store against the configured gateway.
    ///
    /// The connect timeout is bounded; the overall request deliberately is
    /// not, since a content read may stream for longer than any fixed
    /// control-plane bound.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(FetchError::transport)?;

        Ok(Self {
            base_url: config.gateway_url(),
            http,
        })
    }

    /// Store over an explicit gateway base URL (tests, remote gateways).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(FetchError::transport)?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn content_url(&self, cid: &Cid) -> String {
        format!("{}/ipfs/{}", self.base_url, cid.as_str())
    }
}

#[async_trait]
impl ContentStore for GatewayStore {
    async fn size(&self, cid: &Cid) -> Result<Option<u64>, FetchError> {
        let url = self.content_url(cid);
        debug!(url = %url, "Probing content size");

        // Size is optional metadata; any failure here is reported as
        // unknown size, not as a fetch failure.
        let response = match self
            .http
            .head(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return Ok(None),
        };

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(cid.to_string()));
        }

        Ok(response.content_length())
    }

    async fn open(&self, cid: &Cid) -> Result<ByteStream, FetchError> {
        let url = self.content_url(cid);
        debug!(url = %url, "Opening content stream");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(FetchError::transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(cid.to_string())),
            status if status.is_success() => {
                let stream = response.bytes_stream().map_err(FetchError::transport);
                Ok(Box::pin(stream))
            }
            status => Err(FetchError::transport(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("gateway returned status {status}"),
            ))),
        }
    }
}
