//! The object-storage capability consumed by the transfer pipeline.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::error::StoreError;
use crate::types::{UploadRequest, UploadResult};

/// Boxed error type carried by source streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Single-pass, forward-only stream of body bytes to write.
pub type ByteSource = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Capability over a destination object store.
///
/// [`GcsStore`](crate::GcsStore) speaks the GCS JSON API;
/// [`MemoryStore`](crate::MemoryStore) backs the tests. Implementations hold
/// no per-transfer state, so one instance can serve concurrent invocations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the destination object currently exists.
    ///
    /// Connectivity and permission failures surface as
    /// [`StoreError::Access`], never as `false`.
    async fn exists(&self, bucket: &str, object: &str) -> Result<bool, StoreError>;

    /// Stream the source into the destination object.
    ///
    /// Resolves only once the store has acknowledged the full write; the end
    /// of the source stream alone is not completion. On failure the
    /// destination is not reported as written and no generation is produced.
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, StoreError>;
}
