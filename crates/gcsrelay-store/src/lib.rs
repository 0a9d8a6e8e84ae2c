//! Object-storage capability for the URL → object-storage relay.
//!
//! [`ObjectStore`] is the seam the transfer pipeline writes through:
//! existence probe plus streaming upload. [`GcsStore`] speaks the GCS JSON
//! API (resumable session open, single streaming `PUT`); [`MemoryStore`]
//! backs the tests. Destination options ([`StorageClass`], [`PredefinedAcl`])
//! are typed, so an invalid value is rejected at parse time and never
//! reaches a backend.

mod auth;
mod error;
mod gcs;
mod memory;
mod store;
mod types;

pub use auth::Credentials;
pub use error::StoreError;
pub use gcs::GcsStore;
pub use memory::{MemoryObject, MemoryStore};
pub use store::{BoxError, ByteSource, ObjectStore};
pub use types::{PredefinedAcl, StorageClass, UploadRequest, UploadResult, gs_url};
