//! End-to-end pipeline properties over a scripted transport and the
//! in-memory object store. No network is touched.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use gcsrelay::pipeline::{self, RelayError, TransferPlan};
use gcsrelay_fetch::{FetchError, Fetcher, HttpTransport, TransferRequest, TransportResponse};
use gcsrelay_store::{MemoryStore, StorageClass, StoreError};

enum Step {
    Respond {
        status: u16,
        declared_length: u64,
        content_type: &'static str,
        chunks: Vec<Result<Bytes, FetchError>>,
    },
    NetworkError,
}

/// Transport that plays back a fixed script and counts invocations.
struct ScriptedTransport {
    script: Mutex<Vec<Step>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    fn ok(body: &'static str, declared_length: u64) -> Self {
        Self::new(vec![Step::Respond {
            status: 200,
            declared_length,
            content_type: "application/octet-stream",
            chunks: vec![Ok(Bytes::from_static(body.as_bytes()))],
        }])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, _request: &TransferRequest) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let step = self.script.lock().unwrap().remove(0);
        match step {
            Step::Respond {
                status,
                declared_length,
                content_type,
                chunks,
            } => Ok(TransportResponse {
                status,
                declared_length,
                content_type: Some(content_type.to_string()),
                body: Box::pin(stream::iter(chunks)),
            }),
            Step::NetworkError => Err(FetchError::Network("connection refused".into())),
        }
    }
}

fn plan() -> TransferPlan {
    TransferPlan {
        request: TransferRequest::new("https://example.com/data.bin"),
        bucket: "bucket".into(),
        object: "object".into(),
        content_type: None,
        cache_control: None,
        metadata: None,
        storage_class: StorageClass::default(),
        predefined_acl: None,
        skip_if_exists: false,
    }
}

#[tokio::test]
async fn relays_the_body_and_reports_counted_bytes() {
    let fetcher = Fetcher::new(ScriptedTransport::ok("hello world", 11));
    let store = MemoryStore::new();

    let outcome = pipeline::run(&fetcher, &store, plan()).await.unwrap();

    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.bytes_transferred, 11);
    assert_eq!(outcome.gs_url, "gs://bucket/object");
    assert!(!outcome.generation.is_empty());
    assert!(!outcome.object_existed);

    let stored = store.object("bucket", "object").await.unwrap();
    assert_eq!(stored.data, b"hello world");
    // Response content type flows through when the plan sets none.
    assert_eq!(stored.content_type.as_deref(), Some("application/octet-stream"));
}

#[tokio::test]
async fn counted_bytes_beat_the_declared_header() {
    // Origin declares 100 but the stream yields 95; the transfer succeeds
    // and reports what actually flowed.
    let body: &'static str = Box::leak("x".repeat(95).into_boxed_str());
    let fetcher = Fetcher::new(ScriptedTransport::ok(body, 100));
    let store = MemoryStore::new();

    let outcome = pipeline::run(&fetcher, &store, plan()).await.unwrap();

    assert_eq!(outcome.bytes_transferred, 95);
    assert_eq!(store.object("bucket", "object").await.unwrap().data.len(), 95);
}

#[tokio::test]
async fn skip_if_exists_issues_no_fetch_at_all() {
    let fetcher = Fetcher::new(ScriptedTransport::ok("never read", 10));
    let store = MemoryStore::new();
    store.insert("bucket", "object", b"already there".to_vec()).await;

    let mut plan = plan();
    plan.skip_if_exists = true;
    let outcome = pipeline::run(&fetcher, &store, plan).await.unwrap();

    assert_eq!(outcome.status_code, 0);
    assert_eq!(outcome.bytes_transferred, 0);
    assert_eq!(outcome.generation, "");
    assert!(outcome.object_existed);
    assert_eq!(fetcher_calls(&fetcher), 0);
    assert_eq!(store.upload_calls(), 0);
    // The seeded object is untouched.
    assert_eq!(store.object("bucket", "object").await.unwrap().data, b"already there");
}

#[tokio::test]
async fn existing_object_is_overwritten_when_skip_is_off() {
    let fetcher = Fetcher::new(ScriptedTransport::ok("fresh", 5));
    let store = MemoryStore::new();
    store.insert("bucket", "object", b"stale".to_vec()).await;

    let outcome = pipeline::run(&fetcher, &store, plan()).await.unwrap();

    assert_eq!(outcome.bytes_transferred, 5);
    assert!(!outcome.object_existed);
    // No existence probe happens without the skip policy.
    assert_eq!(store.exists_calls(), 0);
    assert_eq!(store.object("bucket", "object").await.unwrap().data, b"fresh");
}

#[tokio::test(start_paused = true)]
async fn transient_fetch_failures_are_retried_to_success() {
    let fetcher = Fetcher::new(ScriptedTransport::new(vec![
        Step::NetworkError,
        Step::NetworkError,
        Step::Respond {
            status: 200,
            declared_length: 2,
            content_type: "text/plain",
            chunks: vec![Ok(Bytes::from_static(b"ok"))],
        },
    ]));
    let store = MemoryStore::new();

    let mut plan = plan();
    plan.request = plan.request.retry_enabled(true);
    let outcome = pipeline::run(&fetcher, &store, plan).await.unwrap();

    assert_eq!(outcome.bytes_transferred, 2);
    assert_eq!(fetcher_calls(&fetcher), 3);
}

#[tokio::test]
async fn fetch_failure_reaches_no_upload() {
    let fetcher = Fetcher::new(ScriptedTransport::new(vec![Step::Respond {
        status: 404,
        declared_length: 0,
        content_type: "text/plain",
        chunks: vec![Ok(Bytes::from_static(b"not found"))],
    }]));
    let store = MemoryStore::new();

    let err = pipeline::run(&fetcher, &store, plan()).await.unwrap_err();

    assert!(matches!(
        err,
        RelayError::Fetch(FetchError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(store.upload_calls(), 0);
    assert!(store.object("bucket", "object").await.is_none());
}

#[tokio::test]
async fn mid_stream_failure_is_not_reported_as_success() {
    let fetcher = Fetcher::new(ScriptedTransport::new(vec![Step::Respond {
        status: 200,
        declared_length: 1000,
        content_type: "application/octet-stream",
        chunks: vec![
            Ok(Bytes::from_static(b"partial")),
            Err(FetchError::Network("connection reset mid-body".into())),
        ],
    }]));
    let store = MemoryStore::new();

    let err = pipeline::run(&fetcher, &store, plan()).await.unwrap_err();

    assert!(matches!(err, RelayError::Store(StoreError::Upload(_))));
    assert!(store.object("bucket", "object").await.is_none());
}

#[tokio::test]
async fn repeat_uploads_get_fresh_generations() {
    let store = MemoryStore::new();

    let fetcher = Fetcher::new(ScriptedTransport::ok("same content", 12));
    let first = pipeline::run(&fetcher, &store, plan()).await.unwrap();

    let fetcher = Fetcher::new(ScriptedTransport::ok("same content", 12));
    let second = pipeline::run(&fetcher, &store, plan()).await.unwrap();

    assert_ne!(first.generation, second.generation);
    assert_eq!(first.gs_url, second.gs_url);
    assert_eq!(first.bytes_transferred, second.bytes_transferred);
}

#[tokio::test]
async fn plan_content_type_overrides_the_response_header() {
    let fetcher = Fetcher::new(ScriptedTransport::ok("data", 4));
    let store = MemoryStore::new();

    let mut plan = plan();
    plan.content_type = Some("text/csv".into());
    pipeline::run(&fetcher, &store, plan).await.unwrap();

    let stored = store.object("bucket", "object").await.unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("text/csv"));
}

fn fetcher_calls(fetcher: &Fetcher<ScriptedTransport>) -> usize {
    // Fetcher owns the transport; peek through for assertions.
    fetcher.transport().calls()
}
