#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A hierarchical stopwatch: a tree of named spans where every span automatically encloses, in
//! time, all the spans nested underneath it.
//!
//! Use it to measure nested phases of a request or a batch job without wiring parent and
//! child timers together by hand. Starting a nested span starts its ancestors if they are not
//! running yet. Stopping a span stops everything still running underneath it and extends its
//! ancestors to cover it.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Simple usage
//!
//! ```
//! use nested_stopwatch::Span;
//!
//! let job = Span::with_key("import");
//!
//! job.start(());
//!
//! job.start("download");
//! // Download something.
//! job.stop("download");
//!
//! job.start(["parse", "header"]);
//! // Parse the header.
//! job.stop(["parse", "header"]);
//! // Parse the rest.
//!
//! // Also stops "parse", which is still running.
//! job.stop(());
//!
//! let result = job.result().unwrap();
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```
//!
//! # Addressing spans
//!
//! Every operation takes a [`Path`] relative to the span it is called on. A path can be
//! written as `()` for the span itself, as a single key (`"download"`, `7`) or as an array,
//! slice or vector of keys (`["parse", "header"]`). Keys are strings or integers, see [`Key`].
//!
//! Spans are created the first time they are started or explicitly with [`Span::create()`].
//! Stopping a span that was never created does nothing.
//!
//! # Timing rules
//!
//! * A span starts no later than any of its children and stops no earlier than any of them.
//! * Starting an already started span can only move its start earlier.
//! * Stopping an already stopped span can only move its stop later.
//! * A span stopped without being started is recorded as a zero-length measurement.
//! * Starting a root span with an empty path discards its previous measurement. This is
//!   configurable via [`Rearm`].
//!
//! Explicit instants can be supplied with [`Span::start_at()`] and [`Span::stop_at()`].
//!
//! # Threading
//!
//! [`Span`] is a cheap clonable handle that can be shared between threads. Any number of
//! threads may start and stop spans of the same tree concurrently. Each span is guarded by its
//! own lock and no operation ever holds more than one lock at a time, so concurrent operations
//! on different branches never block each other for longer than a single field update.
//!
//! # Results
//!
//! [`Span::result()`] returns a [`Snapshot`], a detached copy of the data that can be read or
//! serialized with `serde` while measurement continues. A deserialized snapshot can be turned
//! back into a live tree with [`Snapshot::repair()`].
//!
//! # Process-wide stopwatch
//!
//! The [`global`] module forwards to one process-wide root span, for code that cannot easily
//! pass a [`Span`] around.
//!
//! # Logging
//!
//! Span creation, starts and stops are reported as `trace` events and resets, disabling and
//! ignored stops as `debug` events via the `tracing` crate.

mod constants;
mod error;
pub mod global;
mod id;
mod key;
mod node;
mod pal;
mod snapshot;
mod span;
mod span_builder;

pub(crate) use constants::*;
pub use error::*;
pub use key::*;
pub(crate) use node::*;
pub use snapshot::*;
pub use span::*;
pub use span_builder::*;
