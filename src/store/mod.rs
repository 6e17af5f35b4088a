// Storage-network binding
//
// Filesystem-like abstraction over the content-addressed network: open a
// streaming read handle for a CID, look up its size best-effort, and
// raise a distinguishable not-found for unknown identifiers.

mod gateway;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::cid::Cid;
use crate::errors::FetchError;

pub use gateway::GatewayStore;

/// Streaming byte-read handle returned by [`ContentStore::open`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// Read-side contract against the storage network.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Best-effort size lookup. The network may not know the size in
    /// advance; `None` is normal and never an error.
    async fn size(&self, cid: &Cid) -> Result<Option<u64>, FetchError>;

    /// Open a streaming read handle for the identifier. Unknown
    /// identifiers yield [`FetchError::NotFound`].
    async fn open(&self, cid: &Cid) -> Result<ByteStream, FetchError>;
}
