use std::fmt;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::{DEFAULT_BASE_DELAY, MAX_ATTEMPTS, jittered_delay};
use crate::data::TransferRequest;
use crate::effects::http::{ByteStream, HttpTransport, TransportResponse};
use crate::error::FetchError;

/// Upper bound on the response-body excerpt carried by status errors.
const ERROR_EXCERPT_LIMIT: usize = 2048;

/// Result of a successful fetch: response metadata plus the still-unread body.
///
/// The body stream has not been touched; consuming it is the caller's job,
/// and it can be consumed exactly once.
pub struct FetchResult {
    pub status: u16,
    /// `Content-Length` as declared by the origin; 0 means unknown.
    pub declared_length: u64,
    pub content_type: Option<String>,
    /// Attempts it took to get this response, the successful one included.
    pub attempts: u32,
    pub body: ByteStream,
}

impl fmt::Debug for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResult")
            .field("status", &self.status)
            .field("declared_length", &self.declared_length)
            .field("content_type", &self.content_type)
            .field("attempts", &self.attempts)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Issues requests through a transport, retrying transient failures.
pub struct Fetcher<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The transport this fetcher issues requests through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the URL, returning as soon as response headers arrive.
    ///
    /// With retry enabled on the request, up to [`MAX_ATTEMPTS`] total
    /// attempts are made for transient failures (network errors, timeouts,
    /// 429 and 5xx statuses), with exponentially growing jittered delays in
    /// between. Exhaustion surfaces the last error. Non-2xx responses become
    /// [`FetchError::HttpStatus`] carrying a bounded body excerpt.
    pub async fn fetch(&self, request: &TransferRequest) -> Result<FetchResult, FetchError> {
        let max_attempts = if request.retry_enabled { MAX_ATTEMPTS } else { 1 };
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(request).await {
                Ok(response) => {
                    debug!(
                        url = %request.url,
                        status = response.status,
                        declared_length = response.declared_length,
                        attempt,
                        "response headers received"
                    );
                    return Ok(FetchResult {
                        status: response.status,
                        declared_length: response.declared_length,
                        content_type: response.content_type,
                        attempts: attempt,
                        body: response.body,
                    });
                }
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = jittered_delay(attempt - 1, DEFAULT_BASE_DELAY);
                    warn!(
                        url = %request.url,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, request: &TransferRequest) -> Result<TransportResponse, FetchError> {
        let response = self.transport.send(request).await?;
        if !(200..300).contains(&response.status) {
            let excerpt = read_excerpt(response.body, ERROR_EXCERPT_LIMIT).await;
            return Err(FetchError::HttpStatus {
                status: response.status,
                excerpt,
            });
        }
        Ok(response)
    }
}

/// Read a bounded prefix of the body for diagnostics, then drop the rest.
async fn read_excerpt(mut body: ByteStream, limit: usize) -> String {
    let mut collected: Vec<u8> = Vec::new();
    while collected.len() < limit {
        match body.next().await {
            Some(Ok(chunk)) => {
                let take = (limit - collected.len()).min(chunk.len());
                collected.extend_from_slice(&chunk[..take]);
                if take < chunk.len() {
                    break;
                }
            }
            // The excerpt is best-effort; a broken error body is not worth
            // masking the status error for.
            Some(Err(_)) | None => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}
