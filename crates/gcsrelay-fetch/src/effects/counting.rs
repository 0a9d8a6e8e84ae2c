//! Byte-accurate accounting for body streams.
//!
//! The counted value, not the `Content-Length` header, is what the relay
//! reports: declared lengths are frequently wrong for compressed or chunked
//! transfers.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

use crate::effects::http::ByteStream;
use crate::error::FetchError;

/// Cloneable handle onto the running byte count of a [`CountingStream`].
///
/// The count is monotonically non-decreasing and becomes final once the
/// wrapped stream has yielded its end-of-stream signal.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    /// Bytes observed so far.
    #[must_use]
    pub fn bytes_transferred(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }
}

/// Pass-through stream wrapper that counts every byte it forwards.
///
/// Chunk boundaries and ordering are untouched, nothing is buffered, and
/// errors from the underlying stream propagate unchanged.
pub struct CountingStream {
    inner: ByteStream,
    counter: ByteCounter,
}

impl CountingStream {
    /// Wrap a stream, returning the wrapper and a counter handle that stays
    /// readable after the wrapper has been moved downstream.
    pub fn new(inner: ByteStream) -> (Self, ByteCounter) {
        let counter = ByteCounter::default();
        (
            Self {
                inner,
                counter: counter.clone(),
            },
            counter,
        )
    }
}

impl Stream for CountingStream {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.counter.add(chunk.len() as u64);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
