//! The end-to-end transfer pipeline.
//!
//! One invocation walks `Init → (CheckExistence) → Fetching → Uploading →
//! Reconciling → Done`; any error ends the run as the `Err` arm instead, and
//! a run that fails produces no outputs at all. The fetch's body stream is
//! piped straight into the store's write stream, wrapped in a
//! [`CountingStream`] so the reported size is what actually flowed, not what
//! the origin declared.

use std::collections::HashMap;

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use gcsrelay_fetch::{
    ByteCounter, CountingStream, FetchError, FetchResult, Fetcher, HttpTransport, TransferRequest,
};
use gcsrelay_store::{
    BoxError, ByteSource, ObjectStore, PredefinedAcl, StorageClass, StoreError, UploadRequest,
    UploadResult, gs_url,
};

/// Everything one invocation needs: the source request, the destination and
/// the skip policy.
#[derive(Debug)]
pub struct TransferPlan {
    pub request: TransferRequest,
    pub bucket: String,
    pub object: String,
    /// Stored content type; the response's `Content-Type` is used when unset.
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub storage_class: StorageClass,
    pub predefined_acl: Option<PredefinedAcl>,
    /// Skip the whole transfer, fetch included, when the destination exists.
    pub skip_if_exists: bool,
}

/// Terminal result of a successful run.
///
/// Built exactly once, in the `Done` state; `bytes_transferred` is the
/// counted size, never the declared header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status_code: u16,
    pub bytes_transferred: u64,
    pub gs_url: String,
    pub generation: String,
    pub object_existed: bool,
}

impl TransferOutcome {
    /// Outcome for a transfer short-circuited by the existence gate.
    fn skipped(gs_url: String) -> Self {
        Self {
            status_code: 0,
            bytes_transferred: 0,
            gs_url,
            generation: String::new(),
            object_existed: true,
        }
    }
}

/// Failure from any pipeline state.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pipeline states. Streams and results ride inside the states that own
/// them, so a state cannot observe data it has no right to yet.
enum State {
    Init,
    CheckExistence,
    Fetching,
    Uploading {
        fetch: FetchResult,
    },
    Reconciling {
        status: u16,
        declared_length: u64,
        counter: ByteCounter,
        upload: UploadResult,
    },
}

/// Run one transfer to completion.
pub async fn run<T, S>(
    fetcher: &Fetcher<T>,
    store: &S,
    plan: TransferPlan,
) -> Result<TransferOutcome, RelayError>
where
    T: HttpTransport,
    S: ObjectStore,
{
    let destination = gs_url(&plan.bucket, &plan.object);
    let mut state = State::Init;
    loop {
        state = match state {
            State::Init => {
                if plan.skip_if_exists {
                    State::CheckExistence
                } else {
                    State::Fetching
                }
            }
            State::CheckExistence => {
                if store.exists(&plan.bucket, &plan.object).await? {
                    info!(destination = %destination, "object already exists, skipping transfer");
                    return Ok(TransferOutcome::skipped(destination));
                }
                State::Fetching
            }
            State::Fetching => {
                let fetch = fetcher.fetch(&plan.request).await?;
                debug!(
                    status = fetch.status,
                    declared_length = fetch.declared_length,
                    attempts = fetch.attempts,
                    "fetch stream open"
                );
                State::Uploading { fetch }
            }
            State::Uploading { fetch } => {
                let FetchResult {
                    status,
                    declared_length,
                    content_type,
                    body,
                    ..
                } = fetch;
                let (counted, counter) = CountingStream::new(body);
                let source: ByteSource =
                    Box::pin(counted.map(|chunk| chunk.map_err(|e| Box::new(e) as BoxError)));
                let upload = store
                    .upload(UploadRequest {
                        bucket: plan.bucket.clone(),
                        object: plan.object.clone(),
                        source,
                        content_type: plan.content_type.clone().or(content_type),
                        cache_control: plan.cache_control.clone(),
                        metadata: plan.metadata.clone(),
                        storage_class: plan.storage_class,
                        predefined_acl: plan.predefined_acl,
                    })
                    .await?;
                State::Reconciling {
                    status,
                    declared_length,
                    counter,
                    upload,
                }
            }
            State::Reconciling {
                status,
                declared_length,
                counter,
                upload,
            } => {
                let bytes_transferred = counter.bytes_transferred();
                if declared_length > 0 && declared_length != bytes_transferred {
                    warn!(
                        declared = declared_length,
                        counted = bytes_transferred,
                        "declared content length disagrees with bytes transferred"
                    );
                }
                info!(
                    destination = %upload.gs_url,
                    generation = %upload.generation,
                    bytes = bytes_transferred,
                    "transfer complete"
                );
                // Done.
                return Ok(TransferOutcome {
                    status_code: status,
                    bytes_transferred,
                    gs_url: upload.gs_url,
                    generation: upload.generation,
                    object_existed: false,
                });
            }
        };
    }
}
