//! Error types for gcsrelay-store.

use thiserror::Error;

/// Errors surfaced by object-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad enumerated option. Raised while parsing, before any network call,
    /// so an invalid value never reaches the storage backend.
    #[error("invalid {field}: `{value}` (expected one of: {expected})")]
    Validation {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Existence check or credential failure. Never collapsed into "object
    /// absent" - an unreachable store must not look like a writable one.
    #[error("storage access failed: {0}")]
    Access(String),

    /// Failure while opening, streaming or finalizing the write.
    #[error("upload failed: {0}")]
    Upload(String),
}
