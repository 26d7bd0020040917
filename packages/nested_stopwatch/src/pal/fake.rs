//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::pal::abstractions::Platform;

/// Fake implementation of the platform abstraction for testing.
///
/// The clock only moves when a test moves it. Multiple clones of the same `FakePlatform`
/// share the same underlying time, so a test can keep one clone and advance time while
/// a span tree holds another.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FakePlatform {
    /// Creates a new fake platform frozen at a fixed, arbitrary instant.
    pub(crate) fn new() -> Self {
        let epoch = Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .expect("fixed calendar date is unambiguous");

        Self {
            now: Arc::new(Mutex::new(epoch)),
        }
    }

    /// Moves the clock forward by `delta`.
    ///
    /// This affects all clones of this platform.
    pub(crate) fn advance(&self, delta: TimeDelta) {
        let mut now = self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        *now = now
            .checked_add_signed(delta)
            .expect("test clock stays within the representable range");
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clock_is_frozen_until_advanced() {
        let platform = FakePlatform::new();
        assert_eq!(platform.now(), platform.now());
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();
        let start = platform1.now();

        platform1.advance(TimeDelta::seconds(2));
        assert_eq!(platform2.now(), start + TimeDelta::seconds(2));
    }
}
