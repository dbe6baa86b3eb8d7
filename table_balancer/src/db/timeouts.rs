//! Storage call timeout helpers
//!
//! Wraps repository calls so a stalled database surfaces as a retryable error
//! instead of holding the tournament lock indefinitely.

use crate::seating::{SeatingError, SeatingResult};
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for a load or save (10 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a storage call with timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
///
/// # Returns
///
/// * `SeatingResult<T>` - Result, or `SeatingError::Timeout`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> SeatingResult<T>
where
    F: std::future::Future<Output = SeatingResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(SeatingError::Timeout(duration)),
    }
}
