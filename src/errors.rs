// Error types for the client
//
// Every fallible surface returns a typed error so callers can branch
// (skip a missing asset, retry a transport failure) instead of matching
// on message strings.

use thiserror::Error;

/// Configuration validation and loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required port value was absent at build time.
    #[error("missing required port: {0}")]
    MissingPort(&'static str),

    /// A port value was present but unusable.
    #[error("invalid port for {name}: {value}")]
    InvalidPort { name: &'static str, value: u16 },

    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon supervision errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Neither an existing nor a newly launched daemon became reachable
    /// within the health-check timeout. Fatal to the calling operation.
    #[error("IPFS daemon failed to start: node unreachable at {api_url}")]
    FailedToStart { api_url: String },

    /// The daemon process exists but the health check returned a
    /// non-success status. Non-fatal; logged as a warning by the
    /// supervisor, surfaced here for callers that probe health directly.
    #[error("IPFS daemon is running but unhealthy (status {status})")]
    UnhealthyButRunning { status: u16 },

    #[error("failed to spawn daemon process `{binary}`")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The launched process survived both graceful termination and
    /// force-kill.
    #[error("daemon process {pid} did not stop after terminate and kill")]
    ShutdownFailed { pid: u32 },
}

/// Content retrieval errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The storage network does not know this identifier. Distinguishable
    /// from transport failures so batch callers can skip the asset.
    #[error("no content found for CID {0}")]
    NotFound(String),

    /// Any other I/O failure before or during the streaming read. Partial
    /// data is discarded; fetch is all-or-nothing.
    #[error("transport failure while fetching content")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    pub(crate) fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FetchError::Transport(Box::new(err))
    }
}

/// Catalog search and asset-resolution errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog service failed or returned something we could not
    /// interpret. Carries the original cause; no repair is attempted.
    #[error("catalog service failure")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The item's asset descriptor lacks the expected alternate IPFS href.
    #[error("asset `{asset}` on item `{item_id}` has no IPFS alternate href")]
    MissingAlternate { item_id: String, asset: String },

    #[error("search result index {index} out of bounds (got {len} items)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Catalog search was requested but the client has no STAC endpoint
    /// configured.
    #[error("no STAC endpoint configured")]
    NoEndpoint,
}

impl CatalogError {
    pub(crate) fn collaborator(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CatalogError::Collaborator(Box::new(err))
    }
}

/// Kubo RPC API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("node API request failed")]
    Http(#[source] reqwest::Error),

    #[error("failed to read upload source {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("node API returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response was 2xx but missing the expected field.
    #[error("node API response missing expected field `{field}`")]
    Malformed { field: &'static str },
}

/// Asset conversion errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse CSV content")]
    Csv(#[from] csv::Error),

    #[error("failed to decode raster content")]
    Raster(#[from] image::ImageError),

    #[error("raster dimensions inconsistent with decoded buffer")]
    Dimensions,
}

/// Umbrella error for facade-level operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Daemon(#[from] DaemonError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_cid() {
        let err = FetchError::NotFound("bafybadcid".to_string());
        assert!(err.to_string().contains("bafybadcid"));
    }

    #[test]
    fn test_not_found_distinguishable_from_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = FetchError::transport(io);
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_missing_alternate_message() {
        let err = CatalogError::MissingAlternate {
            item_id: "LC09_tile".to_string(),
            asset: "red".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("red"));
        assert!(msg.contains("LC09_tile"));
    }
}
