//! Platform facade for switching between real and fake implementations.

use chrono::{DateTime, Utc};

use crate::pal::abstractions::Platform;
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;

/// Facade that allows switching between real and fake platform implementations.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    /// Real platform implementation using the system clock.
    Real(RealPlatform),

    /// Fake platform implementation for testing.
    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    /// Creates a new platform facade using the real implementation.
    pub(crate) fn real() -> Self {
        Self::Real(RealPlatform)
    }

    /// Creates a new platform facade using the fake implementation.
    #[cfg(test)]
    pub(crate) fn fake(fake_platform: FakePlatform) -> Self {
        Self::Fake(fake_platform)
    }
}

impl Platform for PlatformFacade {
    fn now(&self) -> DateTime<Utc> {
        match self {
            Self::Real(platform) => platform.now(),
            #[cfg(test)]
            Self::Fake(platform) => platform.now(),
        }
    }
}
