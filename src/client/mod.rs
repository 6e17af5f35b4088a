// Client facade
//
// Composes the daemon supervisor, content fetcher, catalog search, and
// node API into the single entry point applications use.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::api::{AddOptions, NodeApi, PinLsOptions};
use crate::asset::AssetHandle;
use crate::catalog::{CatalogClient, Item, ItemCollection, SearchParams};
use crate::cid::Cid;
use crate::config::ClientConfig;
use crate::convert::{self, CsvTable};
use crate::daemon::DaemonSupervisor;
use crate::errors::{CatalogError, ClientError, DaemonError, FetchError};
use crate::fetch::{ContentFetcher, ProgressReporter};
use crate::store::{ContentStore, GatewayStore};

/// Client for an IPFS-backed STAC workflow.
///
/// Construction validates the configuration and, for a local gateway with
/// `auto_spawn` enabled, ensures the storage-node daemon is running; a
/// daemon that cannot be reached aborts construction.
pub struct Client {
    config: ClientConfig,
    api: Arc<NodeApi>,
    fetcher: Arc<ContentFetcher>,
    catalog: Option<CatalogClient>,
    supervisor: Option<DaemonSupervisor>,
}

impl Client {
    /// Connect with daemon supervision as configured.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let store: Arc<dyn ContentStore> = Arc::new(GatewayStore::new(&config)?);
        Self::connect_with_store(config, store).await
    }

    /// Connect against an explicit content store. Used by callers that
    /// bring their own storage-network binding.
    pub async fn connect_with_store(
        config: ClientConfig,
        store: Arc<dyn ContentStore>,
    ) -> Result<Self, ClientError> {
        let api = Arc::new(NodeApi::new(&config)?);
        let fetcher = Arc::new(ContentFetcher::new(store));

        let catalog = match &config.stac_endpoint {
            Some(endpoint) => Some(CatalogClient::open(endpoint.as_str(), config.request_timeout)?),
            None => None,
        };

        let supervisor = if config.is_local() && config.auto_spawn {
            let supervisor = DaemonSupervisor::new(&config, Arc::clone(&api));
            supervisor.ensure_running().await?;
            Some(supervisor)
        } else {
            None
        };

        info!(
            gateway = %config.gateway_url(),
            api = %config.api_url(),
            supervised = supervisor.is_some(),
            "Client connected"
        );

        Ok(Self {
            config,
            api,
            fetcher,
            catalog,
            supervisor,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- content retrieval -------------------------------------------------

    /// Fetch the raw bytes behind a CID.
    pub async fn fetch(&self, cid: &Cid) -> Result<Bytes, FetchError> {
        self.fetcher.fetch_quiet(cid).await
    }

    /// Fetch with progress reported through `reporter`.
    pub async fn fetch_with_progress(
        &self,
        cid: &Cid,
        reporter: &dyn ProgressReporter,
    ) -> Result<Bytes, FetchError> {
        self.fetcher.fetch(cid, reporter).await
    }

    /// Fetch several CIDs concurrently.
    ///
    /// Per-item results: one unavailable identifier never aborts the
    /// batch, and no ordering is implied between the underlying reads.
    pub async fn fetch_many(&self, cids: &[Cid]) -> Vec<(Cid, Result<Bytes, FetchError>)> {
        let fetches = cids.iter().map(|cid| async move {
            let result = self.fetcher.fetch_quiet(cid).await;
            (cid.clone(), result)
        });
        futures::future::join_all(fetches).await
    }

    /// Fetch a CID and write its contents to the local filesystem.
    pub async fn write_cid(&self, cid: &Cid, path: &Path) -> Result<(), ClientError> {
        let payload = self.fetch(cid).await?;
        tokio::fs::write(path, &payload)
            .await
            .map_err(|source| ClientError::Write {
                path: path.display().to_string(),
                source,
            })
    }

    /// Fetch a CID and parse it as CSV.
    pub async fn csv_from_cid(&self, cid: &Cid) -> Result<CsvTable, ClientError> {
        let payload = self.fetch(cid).await?;
        Ok(convert::csv_table(&payload)?)
    }

    // ---- catalog search ----------------------------------------------------

    fn catalog(&self) -> Result<&CatalogClient, CatalogError> {
        self.catalog.as_ref().ok_or(CatalogError::NoEndpoint)
    }

    /// Run an arbitrary item search against the configured catalog.
    pub async fn search(&self, params: &SearchParams) -> Result<ItemCollection, CatalogError> {
        self.catalog()?.search(params).await
    }

    /// Search the catalog by bounding box and collections.
    pub async fn search_by_bbox(
        &self,
        bbox: [f64; 4],
        collections: Vec<String>,
    ) -> Result<ItemCollection, CatalogError> {
        let params = SearchParams::default().bbox(bbox).collections(collections);
        self.search(&params).await
    }

    /// Search by bounding box and return the single item at `index`.
    pub async fn search_by_bbox_index(
        &self,
        bbox: [f64; 4],
        collections: Vec<String>,
        index: usize,
    ) -> Result<Item, CatalogError> {
        let items = self.search_by_bbox(bbox, collections).await?;
        items.get(index).cloned()
    }

    // ---- asset resolution --------------------------------------------------

    /// Resolve one named asset on an item to a lazily-fetched handle.
    pub fn asset_from_item(
        &self,
        item: &Item,
        asset_name: &str,
    ) -> Result<AssetHandle, CatalogError> {
        let cid = item.asset_cid(asset_name)?;
        Ok(AssetHandle::new(
            cid,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.api),
        ))
    }

    /// Resolve several named assets on an item.
    ///
    /// Lenient aggregation: an asset whose descriptor cannot be resolved
    /// is logged and skipped; the rest of the batch goes through.
    pub fn assets_from_item(&self, item: &Item, asset_names: &[&str]) -> Vec<AssetHandle> {
        let mut handles = Vec::with_capacity(asset_names.len());
        for name in asset_names {
            match self.asset_from_item(item, name) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!(item = %item.id, asset = %name, error = %err, "Skipping unresolvable asset");
                }
            }
        }
        handles
    }

    // ---- node administration ----------------------------------------------

    /// Add a local file to the node, returning its CID.
    pub async fn add_file(&self, path: &Path, opts: &AddOptions) -> Result<Cid, ClientError> {
        Ok(self.api.add_file(path, opts).await?)
    }

    /// Add in-memory bytes to the node, returning the resulting CID.
    pub async fn add_bytes(
        &self,
        data: Vec<u8>,
        file_name: &str,
        opts: &AddOptions,
    ) -> Result<Cid, ClientError> {
        Ok(self.api.add_bytes(data, file_name, opts).await?)
    }

    /// Pin a CID on the node.
    pub async fn pin(&self, cid: &Cid) -> Result<(), ClientError> {
        Ok(self.api.pin_add(cid).await?)
    }

    /// List the node's pinned CIDs. An empty pin set is an empty list.
    pub async fn pinned_list(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.api.pin_ls(&PinLsOptions::default()).await?)
    }

    /// Copy content into the node's mutable files namespace.
    pub async fn files_cp(&self, source: &str, dest: &str) -> Result<(), ClientError> {
        Ok(self.api.files_cp(source, dest).await?)
    }

    // ---- daemon lifecycle --------------------------------------------------

    /// Explicitly release the supervised daemon, if this client launched
    /// one. The defined exit path; the supervisor's drop hook is only a
    /// best-effort safety net.
    pub async fn shutdown_daemon(&self) -> Result<(), DaemonError> {
        match &self.supervisor {
            Some(supervisor) => supervisor.shutdown().await,
            None => Ok(()),
        }
    }
}
