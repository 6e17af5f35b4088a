// ipfs-stac - IPFS-backed STAC asset client
// Library exports

pub mod api;
pub mod asset;
pub mod catalog;
pub mod cid;
pub mod client;
pub mod config;
pub mod convert;
pub mod daemon; // Daemon lifecycle supervision
pub mod errors;
pub mod fetch; // Streaming content retrieval with progress
pub mod store; // Storage-network binding (HTTP gateway)

pub use asset::AssetHandle;
pub use cid::Cid;
pub use client::Client;
pub use config::ClientConfig;
pub use errors::{
    ApiError, CatalogError, ClientError, ConfigError, ConvertError, DaemonError, FetchError,
};
