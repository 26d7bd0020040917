//! Real platform implementation backed by the system clock.

use chrono::{DateTime, Utc};

use crate::pal::abstractions::Platform;

/// Real implementation of the platform abstraction using the system clock.
#[derive(Clone, Debug)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Wall-clock reads are not deterministic.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
