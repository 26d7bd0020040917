use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::id::generate_key;
use crate::snapshot::elapsed_between;
use crate::{Key, Node, Path, Rearm, Result, Snapshot, SpanBuilder};

/// A handle to one span in a tree of nested time measurements.
///
/// A span records when it started and stopped. Starting or stopping a span adjusts its
/// ancestors so that every span encloses, in time, all the spans underneath it. Stopping a
/// span also stops every span underneath it that is still running.
///
/// Spans are addressed by a [`Path`] of keys relative to the span the call is made on.
/// Missing spans are created on first use by [`start()`][Self::start] and
/// [`create()`][Self::create].
///
/// Cloning a `Span` clones the handle, not the tree. Handles can be freely shared between
/// threads and any number of threads can start and stop spans of the same tree concurrently.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Span;
///
/// let request = Span::with_key("request");
///
/// request.start(());
/// request.start("auth");
/// request.stop("auth");
/// request.start(["handler", "db"]);
/// request.stop(());
///
/// let result = request.result().unwrap();
/// let db = result.find(["handler", "db"]).unwrap();
///
/// assert!(db.stopped_at().is_some());
/// assert!(result.elapsed() >= db.elapsed());
/// ```
#[derive(Clone, Debug)]
pub struct Span {
    node: Arc<Node>,
}

impl Span {
    /// Creates a new root span with an empty key and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new root span with the given key and default settings.
    #[must_use]
    pub fn with_key(key: impl Into<Key>) -> Self {
        Self::builder().key(key).build()
    }

    /// Creates a builder for a root span with custom settings.
    #[must_use]
    pub fn builder() -> SpanBuilder {
        SpanBuilder::new()
    }

    pub(crate) fn from_node(node: Arc<Node>) -> Self {
        Self { node }
    }

    /// The key that identifies this span among its siblings.
    #[must_use]
    pub fn key(&self) -> &Key {
        self.node.key()
    }

    /// The keys of every span from the root of the tree down to this one, inclusive.
    ///
    /// Returns an empty list if this span is disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use nested_stopwatch::{Key, Path, Span};
    ///
    /// let root = Span::with_key("job");
    /// let step = root.create(Path::from("extract").join(3));
    ///
    /// assert_eq!(
    ///     step.keys(),
    ///     vec![Key::from("job"), Key::from("extract"), Key::from(3)]
    /// );
    /// ```
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        if self.is_disabled() {
            return Vec::new();
        }

        self.node.keys()
    }

    /// When this span started, if it has.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.node.bounds().0
    }

    /// When this span stopped, if it has.
    #[must_use]
    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.node.bounds().1
    }

    /// Time between start and stop.
    ///
    /// Zero if either has not been recorded yet or if this span is disabled.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }

        let (started_at, stopped_at) = self.node.bounds();
        elapsed_between(started_at, stopped_at)
    }

    /// The span this one is nested in, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.parent().map(Self::from_node)
    }

    /// The spans directly underneath this one, in the order they were created.
    #[must_use]
    pub fn breakdown(&self) -> Vec<Self> {
        self.node
            .children()
            .into_iter()
            .map(Self::from_node)
            .collect()
    }

    /// Returns the span at `path`, creating every missing span on the way.
    ///
    /// With an empty path, a new child with a generated unique key is created instead. Nothing
    /// is started or stopped.
    ///
    /// If this span is disabled, returns this span.
    ///
    /// # Examples
    ///
    /// ```
    /// use nested_stopwatch::Span;
    ///
    /// let root = Span::new();
    ///
    /// let named = root.create("load");
    /// assert_eq!(named.key().to_string(), "load");
    ///
    /// let anonymous = root.create(());
    /// assert!(!anonymous.key().is_empty());
    /// assert_eq!(root.breakdown().len(), 2);
    /// ```
    #[must_use]
    pub fn create(&self, path: impl Into<Path>) -> Self {
        if self.is_disabled() {
            return self.clone();
        }

        let path = path.into();

        let node = if path.is_empty() {
            self.node.push_child(generate_key())
        } else {
            self.node.find_or_create(&path)
        };

        Self::from_node(node)
    }

    /// Returns the span at `path` without creating anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`][crate::Error::NotFound] if any segment of the path does
    /// not exist.
    pub fn find(&self, path: impl Into<Path>) -> Result<Self> {
        self.node.find(&path.into()).map(Self::from_node)
    }

    /// Starts the span at `path` now. See [`start_at()`][Self::start_at].
    #[expect(
        clippy::return_self_not_must_use,
        reason = "the handle is returned for chaining, starting is the point of the call"
    )]
    pub fn start(&self, path: impl Into<Path>) -> Self {
        if self.is_disabled() {
            return self.clone();
        }

        self.start_at(self.node.now(), path)
    }

    /// Starts the span at `path` at the given instant and returns a handle to it.
    ///
    /// Missing spans on the path are created. The recorded start is no later than `instant`,
    /// no later than any start already recorded for the span and no later than the start of
    /// any of its children. Every ancestor that has not started yet, or started later,
    /// adopts the recorded start.
    ///
    /// With an empty path the span itself is started. Depending on the [`Rearm`] policy of
    /// the tree, it is first reset, discarding the previous measurement.
    ///
    /// If this span is disabled, nothing happens and this span is returned.
    #[expect(
        clippy::return_self_not_must_use,
        reason = "the handle is returned for chaining, starting is the point of the call"
    )]
    pub fn start_at(&self, instant: DateTime<Utc>, path: impl Into<Path>) -> Self {
        if self.is_disabled() {
            return self.clone();
        }

        let path = path.into();

        if path.is_empty() && self.rearms() {
            self.node.reset();
        }

        let target = self.node.find_or_create(&path);
        let started_at = target.start_at(instant);

        trace!(key = %target.key(), %path, %started_at, "span started");

        Self::from_node(target)
    }

    /// Stops the span at `path` now. See [`stop_at()`][Self::stop_at].
    pub fn stop(&self, path: impl Into<Path>) {
        if self.is_disabled() {
            return;
        }

        self.stop_at(self.node.now(), path);
    }

    /// Stops the span at `path` at the given instant.
    ///
    /// The recorded stop is no earlier than `instant` and no earlier than anything already
    /// recorded for the span or underneath it. A span stopped without having been started
    /// is recorded as starting at the same instant. Every span underneath it that is still
    /// running is stopped at the same instant and every ancestor that has not stopped yet,
    /// or stopped earlier, is extended to it.
    ///
    /// Stopping a span that does not exist does nothing.
    ///
    /// If this span is disabled, nothing happens.
    pub fn stop_at(&self, instant: DateTime<Utc>, path: impl Into<Path>) {
        if self.is_disabled() {
            return;
        }

        let path = path.into();

        match self.node.find(&path) {
            Ok(target) => {
                let stopped_at = target.stop_at(instant);
                trace!(key = %target.key(), %path, %stopped_at, "span stopped");
            }
            Err(error) => {
                debug!(%error, "ignoring stop of unknown span");
            }
        }
    }

    /// Clears the timestamps of this span, drops its children and detaches it from its parent,
    /// making it an empty root.
    ///
    /// If this span is disabled, nothing happens.
    pub fn reset(&self) {
        if self.is_disabled() {
            return;
        }

        self.node.reset();

        debug!(key = %self.key(), "span reset");
    }

    /// Turns this span into a no-op: starting, stopping, creating and resetting through it do
    /// nothing and [`result()`][Self::result] returns `None`.
    ///
    /// [`find()`][Self::find] keeps resolving existing spans, since it never records or
    /// creates anything. The spans it returns are not disabled unless they were disabled
    /// themselves.
    ///
    /// This only affects calls made on this span, not on other spans of the same tree.
    #[expect(
        clippy::return_self_not_must_use,
        reason = "the handle is returned for chaining only"
    )]
    pub fn disable(&self) -> Self {
        self.node.set_disabled(true);

        debug!(key = %self.key(), "span disabled");

        self.clone()
    }

    /// Reverses [`disable()`][Self::disable].
    #[expect(
        clippy::return_self_not_must_use,
        reason = "the handle is returned for chaining only"
    )]
    pub fn enable(&self) -> Self {
        self.node.set_disabled(false);

        debug!(key = %self.key(), "span enabled");

        self.clone()
    }

    /// Whether this span has been disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.node.is_disabled()
    }

    /// A detached copy of the data in this subtree, or `None` if this span is disabled.
    #[must_use]
    pub fn result(&self) -> Option<Snapshot> {
        if self.is_disabled() {
            return None;
        }

        Some(self.snapshot())
    }

    /// A detached copy of the data in this subtree.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.node.snapshot()
    }

    /// A new, independent tree with the same data as this subtree and the same settings.
    ///
    /// The copy is a root even if this span is not.
    ///
    /// # Examples
    ///
    /// ```
    /// use nested_stopwatch::Span;
    ///
    /// let original = Span::new();
    /// original.start("a");
    ///
    /// let copy = original.copy();
    /// copy.stop("a");
    ///
    /// assert!(copy.find("a").unwrap().stopped_at().is_some());
    /// assert!(original.find("a").unwrap().stopped_at().is_none());
    /// ```
    #[must_use]
    pub fn copy(&self) -> Self {
        Self::from_node(Node::from_snapshot(
            self.node.snapshot(),
            Arc::clone(self.node.settings()),
        ))
    }

    fn rearms(&self) -> bool {
        match self.node.settings().rearm {
            Rearm::Root => self.node.is_root(),
            Rearm::Always => true,
            Rearm::Never => false,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.snapshot().serialize(serializer)
    }
}

impl From<Snapshot> for Span {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.repair()
    }
}
