use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a span among its siblings.
///
/// Keys are either strings or integers. Two keys are equal only if they are the same variant
/// with the same value, so `Key::from(1)` and `Key::from("1")` address different spans.
///
/// The ordering places all integers before all strings.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Key;
///
/// assert_eq!(Key::from("parse"), Key::Str("parse".to_string()));
/// assert_eq!(Key::from(7), Key::Int(7));
/// assert_ne!(Key::from(7), Key::from("7"));
/// ```
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Key {
    /// An integer key, typically a loop index or request number.
    Int(i64),

    /// A string key, typically the name of a phase.
    Str(String),
}

impl Key {
    /// Whether this is the empty string key, used by unnamed roots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Str(s) if s.is_empty())
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::Str(String::new())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&Self> for Key {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

/// An ordered sequence of keys that addresses a span relative to some ancestor.
///
/// The empty path addresses the span the operation is called on. Most operations accept
/// `impl Into<Path>`, so a path can be written as `()`, a single key, an array, a slice or a
/// vector of keys.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::{Key, Path};
///
/// assert!(Path::from(()).is_empty());
/// assert_eq!(Path::from("load").keys(), &[Key::from("load")]);
/// assert_eq!(Path::from(["load", "decode"]).len(), 2);
/// assert_eq!(Path::from(["load", "decode"]).to_string(), "load/decode");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Path {
    keys: Vec<Key>,
}

impl Path {
    /// Creates an empty path that addresses the span itself.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The keys of the path, outermost first.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of keys in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the path addresses the span itself.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn join(&self, key: impl Into<Key>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        Self { keys }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, key) in self.keys.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }

            write!(f, "{key}")?;
        }

        Ok(())
    }
}

impl From<()> for Path {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl From<Key> for Path {
    fn from(value: Key) -> Self {
        Self { keys: vec![value] }
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self::from(Key::from(value))
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        Self::from(Key::from(value))
    }
}

impl From<i64> for Path {
    fn from(value: i64) -> Self {
        Self::from(Key::from(value))
    }
}

impl From<i32> for Path {
    fn from(value: i32) -> Self {
        Self::from(Key::from(value))
    }
}

impl From<u32> for Path {
    fn from(value: u32) -> Self {
        Self::from(Key::from(value))
    }
}

impl<K, const N: usize> From<[K; N]> for Path
where
    K: Into<Key>,
{
    fn from(value: [K; N]) -> Self {
        value.into_iter().collect()
    }
}

impl<K> From<Vec<K>> for Path
where
    K: Into<Key>,
{
    fn from(value: Vec<K>) -> Self {
        value.into_iter().collect()
    }
}

impl<K> From<&[K]> for Path
where
    K: Clone + Into<Key>,
{
    fn from(value: &[K]) -> Self {
        value.iter().cloned().collect()
    }
}

impl From<&Self> for Path {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

impl<K> FromIterator<K> for Path
where
    K: Into<Key>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}
