use std::sync::Arc;

use crate::pal::PlatformFacade;
use crate::{Key, Node, Snapshot, Span};

/// Decides whether starting a span with an empty path first discards its previous measurement.
///
/// Re-arming resets the span: its timestamps are cleared, its children are dropped and it is
/// detached from its parent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum Rearm {
    /// Only a root span is re-armed. `root.start(())` begins a fresh measurement cycle, while
    /// starting a nested span through its own handle keeps it in the tree.
    #[default]
    Root,

    /// Every span started with an empty path is re-armed, including nested spans, which are
    /// thereby detached from their parents.
    Always,

    /// Spans are never re-armed. Starting an already started span only ever moves its start
    /// time earlier.
    Never,
}

/// Settings shared by every span of one tree.
#[derive(Debug)]
pub(crate) struct TreeSettings {
    pub(crate) platform: PlatformFacade,
    pub(crate) rearm: Rearm,
}

/// Creates root instances of [`Span`].
///
/// Use `Span::builder()` to create a new instance of this builder. All properties are optional.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::{Rearm, Span};
///
/// let root = Span::builder().key("nightly_import").rearm(Rearm::Never).build();
///
/// root.start("download");
/// root.stop("download");
///
/// assert_eq!(root.key().to_string(), "nightly_import");
/// ```
#[derive(Debug)]
pub struct SpanBuilder {
    key: Key,
    rearm: Rearm,
    platform: PlatformFacade,
}

impl SpanBuilder {
    pub(crate) fn new() -> Self {
        Self {
            key: Key::default(),
            rearm: Rearm::default(),
            platform: PlatformFacade::real(),
        }
    }

    /// Sets the key of the root span. Defaults to the empty key.
    #[must_use]
    pub fn key(self, key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            ..self
        }
    }

    /// Sets the re-arm policy of the tree. Defaults to [`Rearm::Root`].
    #[must_use]
    pub fn rearm(self, rearm: Rearm) -> Self {
        Self { rearm, ..self }
    }

    /// Uses a specific platform as the source of "now" for the tree.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn platform(self, platform: PlatformFacade) -> Self {
        Self { platform, ..self }
    }

    /// Creates an empty root span.
    #[must_use]
    pub fn build(self) -> Span {
        let (key, settings) = self.into_parts();
        Span::from_node(Node::new_root(key, settings))
    }

    /// Rebuilds a live tree from a snapshot, using the settings of this builder.
    ///
    /// The key of the snapshot takes precedence over any key set on the builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use nested_stopwatch::{Rearm, Snapshot, Span};
    ///
    /// let original = Span::with_key("batch");
    /// original.start("load");
    /// original.stop("load");
    ///
    /// let json = serde_json::to_string(&original.snapshot()).unwrap();
    /// let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    ///
    /// let restored = Span::builder().rearm(Rearm::Never).repair(snapshot);
    /// assert!(restored.find("load").is_ok());
    /// ```
    #[must_use]
    pub fn repair(self, snapshot: Snapshot) -> Span {
        let (_, settings) = self.into_parts();
        Span::from_node(Node::from_snapshot(snapshot, settings))
    }

    fn into_parts(self) -> (Key, Arc<TreeSettings>) {
        (
            self.key,
            Arc::new(TreeSettings {
                platform: self.platform,
                rearm: self.rearm,
            }),
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let span = Span::builder().build();

        assert!(span.key().is_empty());
        assert!(span.parent().is_none());
        assert!(span.started_at().is_none());
        assert!(span.stopped_at().is_none());
    }

    #[test]
    fn key_is_applied_to_root() {
        let span = Span::builder().key(42).build();
        assert_eq!(span.key(), &Key::Int(42));
    }

    #[test]
    fn repair_prefers_snapshot_key() {
        let original = Span::with_key("from_snapshot");
        let restored = Span::builder()
            .key("from_builder")
            .repair(original.snapshot());

        assert_eq!(restored.key(), &Key::from("from_snapshot"));
    }
}
