// Asset handles
//
// A lazily-fetched reference to one content identifier, resolved from a
// catalog item. The payload is populated at most once; pin status is a
// point-in-time query, never a cached value.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ndarray::Array2;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::{NodeApi, PinLsOptions};
use crate::cid::Cid;
use crate::convert::{self, CsvTable};
use crate::errors::{ApiError, ClientError, FetchError};
use crate::fetch::{ContentFetcher, NoopReporter, ProgressReporter};

/// A reference to one asset's content in the storage network.
///
/// Fetch-once semantics: the first `ensure_fetched` populates the payload
/// and later calls return the same bytes. Nothing fetches implicitly;
/// data-dependent operations call `ensure_fetched` themselves and say so.
pub struct AssetHandle {
    cid: Cid,
    display_name: String,
    payload: OnceCell<Bytes>,
    fetcher: Arc<ContentFetcher>,
    api: Arc<NodeApi>,
}

impl AssetHandle {
    pub(crate) fn new(cid: Cid, fetcher: Arc<ContentFetcher>, api: Arc<NodeApi>) -> Self {
        let display_name = cid.display_name().to_string();
        Self {
            cid,
            display_name,
            payload: OnceCell::new(),
            fetcher,
            api,
        }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The payload, if it has been fetched. Never triggers a fetch.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.payload.get()
    }

    /// Fetch the payload if this handle has not fetched it yet.
    pub async fn ensure_fetched(&self) -> Result<&Bytes, FetchError> {
        self.ensure_fetched_with_progress(&NoopReporter).await
    }

    /// As [`AssetHandle::ensure_fetched`], reporting progress when a
    /// fetch actually happens.
    pub async fn ensure_fetched_with_progress(
        &self,
        reporter: &dyn ProgressReporter,
    ) -> Result<&Bytes, FetchError> {
        self.payload
            .get_or_try_init(|| async {
                debug!(cid = %self.cid, "Asset payload not yet fetched, fetching");
                self.fetcher.fetch(&self.cid, reporter).await
            })
            .await
    }

    /// Pin this asset's content on the node. Fetches first so the node
    /// has the blocks to pin.
    pub async fn pin(&self) -> Result<(), ClientError> {
        self.ensure_fetched().await?;
        self.api.pin_add(&self.cid).await?;
        Ok(())
    }

    /// Whether the node currently pins this identifier. Always queries
    /// the node; the result is point-in-time, not a subscription.
    pub async fn is_pinned(&self) -> Result<bool, ApiError> {
        let pins = self.api.pin_ls(&PinLsOptions::default()).await?;
        Ok(pins.iter().any(|p| p == self.cid.as_str()))
    }

    /// Decode the payload as a single-band raster into a 2-D array.
    pub async fn to_array(&self) -> Result<Array2<f32>, ClientError> {
        let payload = self.ensure_fetched().await?;
        Ok(convert::raster_to_array(payload)?)
    }

    /// Parse the payload as CSV.
    pub async fn to_csv(&self) -> Result<CsvTable, ClientError> {
        let payload = self.ensure_fetched().await?;
        Ok(convert::csv_table(payload)?)
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cid.as_str())
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("cid", &self.cid)
            .field("fetched", &self.payload.initialized())
            .finish()
    }
}
