// Content retrieval
//
// Streams a CID's bytes from the storage network, accumulating chunks
// while reporting progress through a side channel. All-or-nothing: a
// mid-stream failure discards partial data.

mod progress;

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::debug;

use crate::cid::Cid;
use crate::errors::FetchError;
use crate::store::ContentStore;

pub use progress::{FetchProgress, IndicatifReporter, NoopReporter, ProgressReporter};

/// Resolves content identifiers to their full byte payloads.
///
/// Each fetch owns its stream handle and buffer, so independent fetches
/// are safe to run on separate tasks with no locking. The handle is
/// released on every exit path: it lives inside the call and drops on
/// success, error, and cancellation alike.
pub struct ContentFetcher {
    store: Arc<dyn ContentStore>,
}

impl ContentFetcher {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Fetch the full payload for `cid`, reporting progress as chunks
    /// arrive.
    ///
    /// Zero-byte content is success with an empty buffer, not
    /// [`FetchError::NotFound`].
    pub async fn fetch(
        &self,
        cid: &Cid,
        reporter: &dyn ProgressReporter,
    ) -> Result<Bytes, FetchError> {
        // Size is optional metadata; never block the fetch on it. A
        // not-found here is authoritative, though, and saves opening a
        // doomed stream.
        let total_bytes = self.store.size(cid).await?;

        reporter.start(cid.display_name(), total_bytes);
        debug!(cid = %cid, total = ?total_bytes, "Starting content fetch");

        let mut stream = self.store.open(cid).await?;
        let mut buffer = match total_bytes {
            Some(len) => BytesMut::with_capacity(len as usize),
            None => BytesMut::new(),
        };

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);
            reporter.advance(FetchProgress {
                bytes_read: buffer.len() as u64,
                total_bytes,
            });
        }

        let payload = buffer.freeze();
        reporter.finish(payload.len() as u64);
        debug!(cid = %cid, bytes = payload.len(), "Content fetch complete");

        Ok(payload)
    }

    /// Fetch without progress reporting.
    pub async fn fetch_quiet(&self, cid: &Cid) -> Result<Bytes, FetchError> {
        self.fetch(cid, &NoopReporter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ByteStream;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store for exercising the fetch loop.
    pub(crate) struct MemoryStore {
        objects: HashMap<String, Vec<u8>>,
        chunk_size: usize,
        advertise_size: bool,
    }

    impl MemoryStore {
        pub(crate) fn new(chunk_size: usize, advertise_size: bool) -> Self {
            Self {
                objects: HashMap::new(),
                chunk_size,
                advertise_size,
            }
        }

        pub(crate) fn insert(&mut self, cid: &str, data: impl Into<Vec<u8>>) {
            self.objects.insert(cid.to_string(), data.into());
        }
    }

    #[async_trait]
    impl ContentStore for MemoryStore {
        async fn size(&self, cid: &Cid) -> Result<Option<u64>, FetchError> {
            match self.objects.get(cid.as_str()) {
                Some(data) if self.advertise_size => Ok(Some(data.len() as u64)),
                Some(_) => Ok(None),
                None => Err(FetchError::NotFound(cid.to_string())),
            }
        }

        async fn open(&self, cid: &Cid) -> Result<ByteStream, FetchError> {
            let data = self
                .objects
                .get(cid.as_str())
                .ok_or_else(|| FetchError::NotFound(cid.to_string()))?
                .clone();
            let chunks: Vec<Result<Bytes, FetchError>> = data
                .chunks(self.chunk_size.max(1))
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    /// Reporter that records every chunk size it observes.
    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<u64>>,
        finished_at: Mutex<Option<u64>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn start(&self, _name: &str, _total: Option<u64>) {}

        fn advance(&self, progress: FetchProgress) {
            self.events.lock().unwrap().push(progress.bytes_read);
        }

        fn finish(&self, total_read: u64) {
            *self.finished_at.lock().unwrap() = Some(total_read);
        }
    }

    fn fetcher_with(store: MemoryStore) -> ContentFetcher {
        ContentFetcher::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_fetch_accumulates_all_chunks() {
        let mut store = MemoryStore::new(4, true);
        store.insert("bafytext", b"the quick brown fox".to_vec());
        let fetcher = fetcher_with(store);

        let reporter = RecordingReporter::default();
        let payload = fetcher
            .fetch(&Cid::new("bafytext"), &reporter)
            .await
            .unwrap();

        assert_eq!(&payload[..], b"the quick brown fox");
        // Final progress equals the total byte count.
        assert_eq!(
            *reporter.finished_at.lock().unwrap(),
            Some(payload.len() as u64)
        );
        // Cumulative counter is monotonic and ends at the payload length.
        let events = reporter.events.lock().unwrap();
        assert!(events.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*events.last().unwrap(), payload.len() as u64);
    }

    #[tokio::test]
    async fn test_fetch_zero_byte_content_is_success() {
        let mut store = MemoryStore::new(8, true);
        store.insert("bafyempty", Vec::new());
        let fetcher = fetcher_with(store);

        let payload = fetcher.fetch_quiet(&Cid::new("bafyempty")).await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unknown_cid_is_not_found() {
        let store = MemoryStore::new(8, true);
        let fetcher = fetcher_with(store);

        let err = fetcher.fetch_quiet(&Cid::new("bafymissing")).await.unwrap_err();
        match err {
            FetchError::NotFound(cid) => assert_eq!(cid, "bafymissing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_works_without_advertised_size() {
        let mut store = MemoryStore::new(3, false);
        store.insert("bafynosize", b"sized later".to_vec());
        let fetcher = fetcher_with(store);

        let payload = fetcher.fetch_quiet(&Cid::new("bafynosize")).await.unwrap();
        assert_eq!(&payload[..], b"sized later");
    }
}
