//! Retry utilities: backoff builders for the few operations the pipeline
//! retries itself.
//!
//! Uses `backon` for exponential backoff with jitter. Everything else relies
//! on the SDK's own retry policy and, ultimately, queue redelivery.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff for re-issuing DynamoDB writes reported as unprocessed.
///
/// - Min delay: 50ms
/// - Max delay: 2s
/// - Max attempts: 5
/// - Jitter enabled
pub fn unprocessed_items_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(50))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(5)
        .with_jitter()
}

/// Backoff for removing an archived upload that still exists after delete.
///
/// - Min delay: 20ms
/// - Max delay: 1s
/// - Max attempts: 3
pub fn archive_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(20))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(3)
}
