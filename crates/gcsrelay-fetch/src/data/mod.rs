//! Immutable request configuration for the relay's HTTP side.

pub mod request;

pub use request::{AuthKind, AuthSpec, DEFAULT_TIMEOUT, Method, TransferRequest};
