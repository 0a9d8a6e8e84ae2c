//! I/O operations: transports, the attempt loop, stream accounting.

mod counting;
mod fetcher;
mod http;

pub use counting::{ByteCounter, CountingStream};
pub use fetcher::{FetchResult, Fetcher};
pub use http::{BoxStream, ByteStream, HttpTransport, ReqwestTransport, TransportResponse};
