//! Platform abstraction layer for wall-clock time.
//!
//! This module provides a platform abstraction that allows switching between
//! the real system clock and a fake clock that tests can move by hand.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
