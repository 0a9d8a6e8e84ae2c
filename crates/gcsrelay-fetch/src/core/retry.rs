use std::time::Duration;

use rand::Rng;

/// Total attempts for a retry-enabled fetch, the initial try included.
pub const MAX_ATTEMPTS: u32 = 3;

/// Default base delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Calculate the backoff ceiling before a retry attempt.
///
/// The formula is `base * 2^retry_count`, saturating instead of overflowing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gcsrelay_fetch::retry_delay;
///
/// let base = Duration::from_millis(500);
/// assert_eq!(retry_delay(0, base), Duration::from_millis(500));
/// assert_eq!(retry_delay(1, base), Duration::from_millis(1000));
/// assert_eq!(retry_delay(2, base), Duration::from_millis(2000));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// [`retry_delay`] with jitter applied: a uniform draw between half the
/// ceiling and the full ceiling, so that parallel invocations retrying the
/// same origin do not stampede in lockstep.
pub fn jittered_delay(retry_count: u32, base: Duration) -> Duration {
    let ceiling = retry_delay(retry_count, base);
    ceiling.mul_f64(rand::rng().random_range(0.5..=1.0))
}

/// Response statuses worth another attempt: throttling and server-side
/// failures. Other client errors will not change on a repeat.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}
