//! Platform abstraction trait definitions.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// Provides the current wall-clock time.
///
/// This trait abstracts the clock used to timestamp spans, allowing for both the real
/// system clock and a fake clock (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}
