use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::data::{Method, TransferRequest};
use crate::error::FetchError;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A single-pass, forward-only handle to a live response body.
///
/// Owning the handle is owning the body: it can be consumed exactly once,
/// and dropping it releases the underlying connection.
pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// What a transport hands back once response headers have arrived.
///
/// The body has not been read at this point; `declared_length` is whatever
/// the `Content-Length` header advertised (0 when absent or non-numeric,
/// which chunked responses routinely are).
pub struct TransportResponse {
    pub status: u16,
    pub declared_length: u64,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("declared_length", &self.declared_length)
            .field("content_type", &self.content_type)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Asynchronous HTTP transport capability.
///
/// Implementations own connection management, redirect following and the
/// whole-request timeout, and must hand the response back as soon as headers
/// arrive, without buffering the body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue the request and return the streaming response.
    async fn send(&self, request: &TransferRequest) -> Result<TransportResponse, FetchError>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gcsrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &TransferRequest) -> Result<TransportResponse, FetchError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        if let Some(value) = request.auth.authorization_header() {
            builder = builder.header(reqwest::header::AUTHORIZATION, value);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let declared_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(map_reqwest_error)));

        Ok(TransportResponse {
            status,
            declared_length,
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_builder() {
        FetchError::InvalidUrl(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}
