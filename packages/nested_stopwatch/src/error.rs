use thiserror::Error;

use crate::Path;

/// Errors that can occur when addressing spans in a timing tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A read-only lookup could not resolve the requested path.
    #[error("no span exists at path '{path}'")]
    NotFound {
        /// The path that was requested, relative to the span the lookup started from.
        path: Path,
    },
}

/// A specialized `Result` type for timing tree operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
