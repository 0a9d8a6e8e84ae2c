//! In-memory [`ObjectStore`] for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{ByteSource, ObjectStore};
use crate::types::{StorageClass, UploadRequest, UploadResult, gs_url};

/// A single stored object.
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub data: Vec<u8>,
    pub generation: u64,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub storage_class: StorageClass,
}

/// In-memory object store.
///
/// Each write gets a fresh generation, like the real store. The call
/// counters back the pipeline tests' zero-network assertions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), MemoryObject>>,
    next_generation: AtomicU64,
    exists_calls: AtomicUsize,
    upload_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object so existence checks see it.
    pub async fn insert(&self, bucket: &str, object: &str, data: Vec<u8>) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.objects.lock().await.insert(
            (bucket.to_string(), object.to_string()),
            MemoryObject {
                data,
                generation,
                content_type: None,
                cache_control: None,
                metadata: None,
                storage_class: StorageClass::default(),
            },
        );
    }

    /// Stored object, if present.
    pub async fn object(&self, bucket: &str, object: &str) -> Option<MemoryObject> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), object.to_string()))
            .cloned()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::Relaxed)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, bucket: &str, object: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .objects
            .lock()
            .await
            .contains_key(&(bucket.to_string(), object.to_string())))
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, StoreError> {
        self.upload_calls.fetch_add(1, Ordering::Relaxed);
        let UploadRequest {
            bucket,
            object,
            mut source,
            content_type,
            cache_control,
            metadata,
            storage_class,
            predefined_acl: _,
        } = request;

        // Chunk-by-chunk like the real write stream; a failing source must
        // leave no object behind.
        let mut data = Vec::new();
        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| StoreError::Upload(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.objects.lock().await.insert(
            (bucket.clone(), object.clone()),
            MemoryObject {
                data,
                generation,
                content_type,
                cache_control,
                metadata,
                storage_class,
            },
        );
        Ok(UploadResult {
            generation: generation.to_string(),
            gs_url: gs_url(&bucket, &object),
        })
    }
}
