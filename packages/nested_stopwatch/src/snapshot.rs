use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::{Error, Key, Path, Result, Span};

/// A detached copy of the data in a span tree.
///
/// A snapshot shares nothing with the tree it was taken from. Reading or serializing it takes
/// no locks and does not observe later start or stop calls.
///
/// The serialized form is one object per span:
///
/// * `id` - the key, omitted if empty. `key` is accepted as an alias when deserializing.
/// * `started_at`, `stopped_at` - RFC 3339 timestamps, `null` if not set.
/// * `elapsed` - nanoseconds between the two. Ignored when deserializing.
/// * `breakdown` - children in insertion order, omitted if there are none.
///
/// A deserialized snapshot is turned back into a live tree with [`repair()`][Self::repair].
///
/// # Examples
///
/// ```
/// use nested_stopwatch::{Snapshot, Span};
///
/// let root = Span::new();
/// root.start(["render", "layout"]);
/// root.stop(());
///
/// let snapshot = root.snapshot();
/// let layout = snapshot.find(["render", "layout"]).unwrap();
/// assert!(layout.elapsed() <= snapshot.elapsed());
///
/// let json = serde_json::to_string_pretty(&snapshot).unwrap();
/// let decoded: Snapshot = serde_json::from_str(&json).unwrap();
/// assert_eq!(decoded, snapshot);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Snapshot {
    #[serde(rename = "id", alias = "key", default)]
    key: Key,

    #[serde(default)]
    started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    stopped_at: Option<DateTime<Utc>>,

    #[serde(default)]
    breakdown: Vec<Self>,
}

impl Snapshot {
    pub(crate) fn new(
        key: Key,
        started_at: Option<DateTime<Utc>>,
        stopped_at: Option<DateTime<Utc>>,
        breakdown: Vec<Self>,
    ) -> Self {
        Self {
            key,
            started_at,
            stopped_at,
            breakdown,
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Key,
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
        Vec<Self>,
    ) {
        (self.key, self.started_at, self.stopped_at, self.breakdown)
    }

    /// The key of the span.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// When the span started, if it has.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the span stopped, if it has.
    #[must_use]
    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.stopped_at
    }

    /// Time between start and stop, or zero if either is not set.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        elapsed_between(self.started_at, self.stopped_at)
    }

    /// The children of the span in the order they were created.
    #[must_use]
    pub fn breakdown(&self) -> &[Self] {
        &self.breakdown
    }

    /// Looks up a span in this snapshot by its path relative to this span.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if any segment of the path does not exist.
    pub fn find(&self, path: impl Into<Path>) -> Result<&Self> {
        let path = path.into();
        let mut current = self;

        for key in path.keys() {
            current = current
                .breakdown
                .iter()
                .find(|child| child.key == *key)
                .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        }

        Ok(current)
    }

    /// Rebuilds a live span tree from this snapshot, with default settings.
    ///
    /// Only the data survives serialization. This re-establishes the parent links and locks
    /// that start and stop calls rely on. Use [`SpanBuilder::repair()`][crate::SpanBuilder::repair]
    /// to rebuild with non-default settings.
    #[must_use]
    pub fn repair(self) -> Span {
        Span::builder().repair(self)
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let field_count = match (self.key.is_empty(), self.breakdown.is_empty()) {
            (true, true) => 3,
            (false, false) => 5,
            _ => 4,
        };

        let mut state = serializer.serialize_struct("Snapshot", field_count)?;

        if self.key.is_empty() {
            state.skip_field("id")?;
        } else {
            state.serialize_field("id", &self.key)?;
        }

        state.serialize_field("started_at", &self.started_at)?;
        state.serialize_field("stopped_at", &self.stopped_at)?;
        state.serialize_field(
            "elapsed",
            &u64::try_from(self.elapsed().as_nanos()).unwrap_or(u64::MAX),
        )?;

        if self.breakdown.is_empty() {
            state.skip_field("breakdown")?;
        } else {
            state.serialize_field("breakdown", &self.breakdown)?;
        }

        state.end()
    }
}

pub(crate) fn elapsed_between(
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
) -> Duration {
    match (started_at, stopped_at) {
        (Some(started_at), Some(stopped_at)) => stopped_at
            .signed_duration_since(started_at)
            .to_std()
            .unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}
