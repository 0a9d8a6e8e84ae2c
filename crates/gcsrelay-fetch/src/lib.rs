//! Streaming HTTP fetching for the URL → object-storage relay.
//!
//! # Architecture
//!
//! This crate follows a three-layer pattern:
//! - [`data`] - immutable request configuration
//! - [`core`] - pure retry/backoff transformations
//! - [`effects`] - transports and streaming I/O
//!
//! # Key properties
//!
//! - **Streaming**: the response body is handed back as soon as headers
//!   arrive; nothing is buffered beyond what the transport already holds
//! - **Single-pass**: body handles are owned, forward-only streams
//! - **Accounted**: [`CountingStream`] makes the observed byte count, not the
//!   declared `Content-Length`, the authoritative transfer size
//! - **Mechanism-only**: retry lives here; skip/overwrite policy belongs to
//!   the caller

mod core;
mod data;
mod effects;
mod error;

pub use crate::core::{
    DEFAULT_BASE_DELAY, MAX_ATTEMPTS, is_transient_status, jittered_delay, retry_delay,
};
pub use crate::data::{AuthKind, AuthSpec, DEFAULT_TIMEOUT, Method, TransferRequest};
pub use crate::effects::{
    BoxStream, ByteCounter, ByteStream, CountingStream, FetchResult, Fetcher, HttpTransport,
    ReqwestTransport, TransportResponse,
};
pub use crate::error::{FetchError, ParseAuthKindError, ParseMethodError};
