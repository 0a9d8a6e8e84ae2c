//! GCS JSON API implementation of [`ObjectStore`].
//!
//! The write path is a resumable upload: one session-open `POST` that
//! attaches the object resource (content type, cache control, custom
//! metadata, storage class) and the predefined ACL, then a single streaming
//! `PUT` of the whole body to the returned session URI. Backpressure flows
//! through the connection: the request body pulls from the source stream
//! only as fast as the store acknowledges bytes.

use std::collections::HashMap;

use futures_util::StreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::Credentials;
use crate::error::StoreError;
use crate::store::{ByteSource, ObjectStore};
use crate::types::{StorageClass, UploadRequest, UploadResult, gs_url};

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const EMULATOR_ENV: &str = "STORAGE_EMULATOR_HOST";

/// Upper bound on error-response detail carried into error messages.
const ERROR_DETAIL_LIMIT: usize = 512;

/// Object store speaking the GCS JSON API over the shared HTTP client.
#[derive(Debug)]
pub struct GcsStore {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

/// Object resource attached when the resumable session is opened.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a HashMap<String, String>>,
    storage_class: StorageClass,
}

/// The slice of the object resource the finalize response is read for.
#[derive(Debug, Deserialize)]
struct StoredObject {
    generation: String,
}

impl GcsStore {
    /// Store against the public GCS endpoint with ambient credentials, or
    /// anonymously against `STORAGE_EMULATOR_HOST` when that is set.
    pub fn from_env() -> Result<Self, StoreError> {
        match std::env::var(EMULATOR_ENV) {
            Ok(host) if !host.is_empty() => {
                let endpoint = if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("http://{host}")
                };
                debug!(endpoint = %endpoint, "using storage emulator");
                Self::new(endpoint, Credentials::anonymous())
            }
            _ => Self::new(DEFAULT_ENDPOINT, Credentials::ambient()),
        }
    }

    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gcsrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Access(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn object_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            bucket,
            encode_object(object)
        )
    }

    fn resumable_init_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=resumable&name={}",
            self.endpoint,
            bucket,
            encode_object(object)
        )
    }

    async fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        match self.credentials.bearer_token(&self.http).await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for GcsStore {
    async fn exists(&self, bucket: &str, object: &str) -> Result<bool, StoreError> {
        let url = format!("{}?fields=name", self.object_url(bucket, object));
        let request = self.authorize(self.http.get(&url)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Access(e.to_string()))?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => {
                let detail = bounded_detail(response).await;
                Err(StoreError::Access(format!(
                    "existence check for {} returned {status}: {detail}",
                    gs_url(bucket, object)
                )))
            }
        }
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, StoreError> {
        let UploadRequest {
            bucket,
            object,
            source,
            content_type,
            cache_control,
            metadata,
            storage_class,
            predefined_acl,
        } = request;

        let mut init_url = self.resumable_init_url(&bucket, &object);
        if let Some(acl) = predefined_acl {
            init_url.push_str("&predefinedAcl=");
            init_url.push_str(acl.as_str());
        }
        let resource = ObjectResource {
            content_type: content_type.as_deref(),
            cache_control: cache_control.as_deref(),
            metadata: metadata.as_ref(),
            storage_class,
        };
        let mut init = self.http.post(&init_url).json(&resource);
        if let Some(ct) = content_type.as_deref() {
            init = init.header("X-Upload-Content-Type", ct);
        }
        let init = self.authorize(init).await?;
        // The source stream is still unread here; dropping it on an early
        // return closes the origin connection.
        let response = init
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("session open: {e}")))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = bounded_detail(response).await;
            return Err(StoreError::Upload(format!(
                "session open returned {status}: {detail}"
            )));
        }
        let session = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                StoreError::Upload("session open response had no Location header".into())
            })?;
        debug!(bucket = %bucket, object = %object, "resumable session open");

        // The session URI carries its own authorization.
        let finalize = self
            .http
            .put(&session)
            .body(reqwest::Body::wrap_stream(source))
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("streaming write: {e}")))?;
        if !finalize.status().is_success() {
            let status = finalize.status().as_u16();
            let detail = bounded_detail(finalize).await;
            return Err(StoreError::Upload(format!(
                "write finalize returned {status}: {detail}"
            )));
        }
        let stored: StoredObject = finalize
            .json()
            .await
            .map_err(|e| StoreError::Upload(format!("finalize response: {e}")))?;
        info!(
            bucket = %bucket,
            object = %object,
            generation = %stored.generation,
            "object written"
        );
        Ok(UploadResult {
            generation: stored.generation,
            gs_url: gs_url(&bucket, &object),
        })
    }
}

/// Object names may contain `/` and other reserved characters; they travel
/// percent-encoded as a single path segment.
fn encode_object(object: &str) -> String {
    utf8_percent_encode(object, NON_ALPHANUMERIC).to_string()
}

/// Read a bounded prefix of an error response for diagnostics.
async fn bounded_detail(response: reqwest::Response) -> String {
    let mut body = response.bytes_stream();
    let mut collected: Vec<u8> = Vec::new();
    while collected.len() < ERROR_DETAIL_LIMIT {
        match body.next().await {
            Some(Ok(chunk)) => {
                let take = (ERROR_DETAIL_LIMIT - collected.len()).min(chunk.len());
                collected.extend_from_slice(&chunk[..take]);
                if take < chunk.len() {
                    break;
                }
            }
            _ => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}
