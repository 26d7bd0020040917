//! Internal state of a single span and the propagation rules that keep a tree consistent.
//!
//! Every node guards its own timestamps and children with its own lock. No code path in this
//! module holds two node locks at the same time: lookups lock one level at a time and
//! propagation re-acquires the lock of each ancestor or descendant it visits. Propagated
//! updates are monotonic (starts only move earlier, stops only move later), so concurrent
//! propagations through a shared ancestor converge on the same bounds in any order.

use std::any::type_name;
use std::fmt;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::pal::Platform;
use crate::{ERR_POISONED_LOCK, Error, Key, Path, Result, Snapshot, TreeSettings};

pub(crate) type Timestamp = DateTime<Utc>;

#[derive(Debug, Default)]
struct NodeState {
    started_at: Option<Timestamp>,
    stopped_at: Option<Timestamp>,

    /// Children in insertion order. Keys are unique among them.
    breakdown: Vec<Arc<Node>>,
}

pub(crate) struct Node {
    key: Key,

    /// Navigation only. The parent owns us through its breakdown, never the other way around.
    parent: RwLock<Weak<Node>>,

    state: RwLock<NodeState>,
    disabled: AtomicBool,
    settings: Arc<TreeSettings>,
}

impl Node {
    pub(crate) fn new_root(key: Key, settings: Arc<TreeSettings>) -> Arc<Self> {
        Arc::new(Self {
            key,
            parent: RwLock::new(Weak::new()),
            state: RwLock::default(),
            disabled: AtomicBool::new(false),
            settings,
        })
    }

    fn new_child(self: &Arc<Self>, key: Key) -> Arc<Self> {
        Arc::new(Self {
            key,
            parent: RwLock::new(Arc::downgrade(self)),
            state: RwLock::default(),
            disabled: AtomicBool::new(false),
            settings: Arc::clone(&self.settings),
        })
    }

    /// Builds a live tree out of plain snapshot data, linking every child to its parent.
    pub(crate) fn from_snapshot(snapshot: Snapshot, settings: Arc<TreeSettings>) -> Arc<Self> {
        Self::rebuild(snapshot, Weak::new(), &settings)
    }

    fn rebuild(snapshot: Snapshot, parent: Weak<Self>, settings: &Arc<TreeSettings>) -> Arc<Self> {
        let (key, started_at, stopped_at, breakdown) = snapshot.into_parts();

        Arc::new_cyclic(|this| Self {
            key,
            parent: RwLock::new(parent),
            state: RwLock::new(NodeState {
                started_at,
                stopped_at,
                breakdown: breakdown
                    .into_iter()
                    .map(|child| Self::rebuild(child, Weak::clone(this), settings))
                    .collect(),
            }),
            disabled: AtomicBool::new(false),
            settings: Arc::clone(settings),
        })
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn settings(&self) -> &Arc<TreeSettings> {
        &self.settings
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.settings.platform.now()
    }

    pub(crate) fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().expect(ERR_POISONED_LOCK)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().expect(ERR_POISONED_LOCK)
    }

    pub(crate) fn parent(&self) -> Option<Arc<Self>> {
        self.parent.read().expect(ERR_POISONED_LOCK).upgrade()
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Both bounds, read under one lock so they are never observed half-updated.
    pub(crate) fn bounds(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        let state = self.read_state();
        (state.started_at, state.stopped_at)
    }

    pub(crate) fn started_at(&self) -> Option<Timestamp> {
        self.read_state().started_at
    }

    pub(crate) fn children(&self) -> Vec<Arc<Self>> {
        self.read_state().breakdown.clone()
    }

    /// Keys from the root of the tree down to this node.
    pub(crate) fn keys(&self) -> Vec<Key> {
        let mut keys = vec![self.key.clone()];

        let mut next = self.parent();
        while let Some(node) = next {
            keys.push(node.key.clone());
            next = node.parent();
        }

        keys.reverse();
        keys
    }

    fn child(&self, key: &Key) -> Option<Arc<Self>> {
        self.read_state()
            .breakdown
            .iter()
            .find(|child| child.key == *key)
            .cloned()
    }

    /// Resolves `path` without modifying the tree.
    pub(crate) fn find(self: &Arc<Self>, path: &Path) -> Result<Arc<Self>> {
        let mut current = Arc::clone(self);

        for key in path.keys() {
            current = current.child(key).ok_or_else(|| Error::NotFound { path: path.clone() })?;
        }

        Ok(current)
    }

    /// Resolves `path`, creating every missing segment on the way.
    pub(crate) fn find_or_create(self: &Arc<Self>, path: &Path) -> Arc<Self> {
        let mut current = Arc::clone(self);

        for key in path.keys() {
            current = current.child_or_insert(key);
        }

        current
    }

    fn child_or_insert(self: &Arc<Self>, key: &Key) -> Arc<Self> {
        if let Some(child) = self.child(key) {
            return child;
        }

        let mut state = self.write_state();

        // Someone may have created it between our read and write locks.
        if let Some(child) = state.breakdown.iter().find(|child| child.key == *key) {
            return Arc::clone(child);
        }

        let child = self.new_child(key.clone());
        state.breakdown.push(Arc::clone(&child));

        trace!(key = %child.key, parent = %self.key, "span created");

        child
    }

    /// Appends a new child without looking for an existing one with the same key.
    pub(crate) fn push_child(self: &Arc<Self>, key: Key) -> Arc<Self> {
        let child = self.new_child(key);
        self.write_state().breakdown.push(Arc::clone(&child));

        trace!(key = %child.key, parent = %self.key, "span created");

        child
    }

    /// Records a start no later than `instant` and makes every ancestor start no later than
    /// that. Returns the start time that was recorded.
    pub(crate) fn start_at(&self, instant: Timestamp) -> Timestamp {
        // Work measured underneath us before we were started still belongs to us.
        let candidate = self
            .children()
            .iter()
            .filter_map(|child| child.started_at())
            .fold(instant, Ord::min);

        let started_at = {
            let mut state = self.write_state();
            let started_at = state
                .started_at
                .map_or(candidate, |current| current.min(candidate));
            state.started_at = Some(started_at);
            started_at
        };

        self.extend_ancestors_start(started_at);

        started_at
    }

    fn extend_ancestors_start(&self, started_at: Timestamp) {
        let mut next = self.parent();

        while let Some(node) = next {
            {
                let mut state = node.write_state();
                if state
                    .started_at
                    .is_none_or(|current| current > started_at)
                {
                    state.started_at = Some(started_at);
                }
            }

            next = node.parent();
        }
    }

    /// Records a stop no earlier than `instant`, closes every descendant that is still running
    /// and makes every ancestor start no later and stop no earlier than this span. Returns the
    /// stop time that was recorded.
    pub(crate) fn stop_at(&self, instant: Timestamp) -> Timestamp {
        // Nothing already recorded in the subtree may end up after our own stop.
        let candidate = self.latest_recorded().map_or(instant, |latest| latest.max(instant));

        let (started_at, mut stopped_at) = {
            let mut state = self.write_state();
            let stopped_at = state
                .stopped_at
                .map_or(candidate, |current| current.max(candidate));
            state.stopped_at = Some(stopped_at);

            let started_at = *state.started_at.get_or_insert(stopped_at);

            (started_at, stopped_at)
        };

        // A span that was never started may have been stopped before an ancestor started.
        self.extend_ancestors_start(started_at);

        match self.close_open_descendants(stopped_at) {
            Some(closed_at) if closed_at > stopped_at => {
                // A descendant was started concurrently after we computed our candidate.
                self.extend_stop(closed_at);
                stopped_at = closed_at;
            }
            _ => {}
        }

        let mut next = self.parent();
        while let Some(node) = next {
            node.extend_stop(stopped_at);
            next = node.parent();
        }

        stopped_at
    }

    /// Stops every descendant that has not been stopped yet at `stopped_at`.
    ///
    /// Returns the latest stop assigned in the subtree, or `None` if nothing had to be closed.
    fn close_open_descendants(&self, stopped_at: Timestamp) -> Option<Timestamp> {
        let mut latest_closed: Option<Timestamp> = None;

        for child in self.children() {
            let closed_below = child.close_open_descendants(stopped_at);
            let floor = closed_below.map_or(stopped_at, |below| below.max(stopped_at));

            let mut state = child.write_state();

            let assigned = match state.stopped_at {
                None => Some(state.started_at.map_or(floor, |start| start.max(floor))),
                Some(current) if closed_below.is_some_and(|below| below > current) => Some(floor),
                Some(_) => None,
            };

            if let Some(assigned) = assigned {
                state.stopped_at = Some(assigned);

                if state.started_at.is_none() {
                    state.started_at = Some(assigned);
                }

                latest_closed = latest_closed.max(Some(assigned));
            }
        }

        latest_closed
    }

    fn extend_stop(&self, stopped_at: Timestamp) {
        let mut state = self.write_state();

        if state
            .stopped_at
            .is_none_or(|current| current < stopped_at)
        {
            state.stopped_at = Some(stopped_at);
        }

        if state.started_at.is_none() {
            state.started_at = Some(stopped_at);
        }
    }

    /// The latest start or stop recorded anywhere in this subtree, including this node.
    fn latest_recorded(&self) -> Option<Timestamp> {
        let (own, children) = {
            let state = self.read_state();
            (
                state.started_at.max(state.stopped_at),
                state.breakdown.clone(),
            )
        };

        children
            .iter()
            .map(|child| child.latest_recorded())
            .fold(own, Ord::max)
    }

    /// Clears the timestamps, drops the children and detaches from the parent.
    pub(crate) fn reset(&self) {
        let children = {
            let mut state = self.write_state();
            state.started_at = None;
            state.stopped_at = None;
            mem::take(&mut state.breakdown)
        };

        // Handles to the dropped children may outlive this call. They become roots.
        for child in &children {
            *child.parent.write().expect(ERR_POISONED_LOCK) = Weak::new();
        }

        let parent = mem::take(&mut *self.parent.write().expect(ERR_POISONED_LOCK));

        if let Some(parent) = parent.upgrade() {
            parent
                .write_state()
                .breakdown
                .retain(|child| !ptr::eq(Arc::as_ptr(child), self));
        }
    }

    /// Deep copy of the data in this subtree.
    pub(crate) fn snapshot(&self) -> Snapshot {
        let (started_at, stopped_at, children) = {
            let state = self.read_state();
            (state.started_at, state.stopped_at, state.breakdown.clone())
        };

        Snapshot::new(
            self.key.clone(),
            started_at,
            stopped_at,
            children.iter().map(|child| child.snapshot()).collect(),
        )
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (started_at, stopped_at) = self.bounds();
        let child_count = self.read_state().breakdown.len();

        f.debug_struct(type_name::<Self>())
            .field("key", &self.key)
            .field("started_at", &started_at)
            .field("stopped_at", &stopped_at)
            .field("child_count", &child_count)
            .field("disabled", &self.is_disabled())
            .finish_non_exhaustive()
    }
}
