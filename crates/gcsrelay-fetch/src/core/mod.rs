//! Pure retry and backoff logic, free of I/O.

mod retry;

pub use retry::{DEFAULT_BASE_DELAY, MAX_ATTEMPTS, is_transient_status, jittered_delay, retry_delay};
