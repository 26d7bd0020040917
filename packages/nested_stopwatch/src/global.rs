//! A process-wide stopwatch for code that does not want to pass a [`Span`] around.
//!
//! The process-wide root is created with default settings on first use and lives until the
//! process exits. Every function here forwards to the same method on [`global()`]. Call
//! [`reset()`] to discard everything measured so far.
//!
//! Prefer passing an explicit [`Span`] where possible. Everything in the process shares this
//! one tree, including tests running in parallel in the same binary.
//!
//! # Examples
//!
//! ```
//! use nested_stopwatch::global;
//!
//! global::start(());
//! global::start("startup");
//! global::stop("startup");
//! global::stop(());
//!
//! let result = global::result().unwrap();
//! assert!(result.find("startup").is_ok());
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use crate::{Path, Snapshot, Span};

static GLOBAL: LazyLock<Span> = LazyLock::new(Span::new);

/// The process-wide root span.
#[must_use]
pub fn global() -> &'static Span {
    &GLOBAL
}

/// Forwards to [`Span::start()`] on the process-wide root.
pub fn start(path: impl Into<Path>) -> Span {
    GLOBAL.start(path)
}

/// Forwards to [`Span::start_at()`] on the process-wide root.
pub fn start_at(instant: DateTime<Utc>, path: impl Into<Path>) -> Span {
    GLOBAL.start_at(instant, path)
}

/// Forwards to [`Span::stop()`] on the process-wide root.
pub fn stop(path: impl Into<Path>) {
    GLOBAL.stop(path);
}

/// Forwards to [`Span::stop_at()`] on the process-wide root.
pub fn stop_at(instant: DateTime<Utc>, path: impl Into<Path>) {
    GLOBAL.stop_at(instant, path);
}

/// Forwards to [`Span::reset()`] on the process-wide root.
pub fn reset() {
    GLOBAL.reset();
}

/// Forwards to [`Span::result()`] on the process-wide root.
#[must_use]
pub fn result() -> Option<Snapshot> {
    GLOBAL.result()
}

/// Forwards to [`Span::copy()`] on the process-wide root.
#[must_use]
pub fn copy() -> Span {
    GLOBAL.copy()
}

/// Forwards to [`Span::disable()`] on the process-wide root.
pub fn disable() -> Span {
    GLOBAL.disable()
}

/// Forwards to [`Span::enable()`] on the process-wide root.
pub fn enable() -> Span {
    GLOBAL.enable()
}
