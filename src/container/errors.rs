use crate::resource::ResourceError;
use std::io;
use std::path::PathBuf;

/// Alias for `Result<T, ArchiveError>`.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Possible errors when opening a [`Container`](super::Container).
///
/// Once a container is open, failures are reported per entry as
/// [`ResourceError`] instead.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// The archive itself is unreadable due to not existing,
    /// unsupported format, or malformed state.
    ///
    /// Path *is* [`None`] when the archive is read from memory.
    #[error("[UnreadableArchive - `{path:?}`]: {source}")]
    UnreadableArchive {
        /// The root cause of this error.
        source: io::Error,
        /// The path responsible for triggering the error, if applicable.
        path: Option<PathBuf>,
    },

    /// The archive is readable, although its format is not supported
    /// (e.g., not a ZIP archive).
    #[error("[UnsupportedFormat - `{path:?}`]: {source}")]
    UnsupportedFormat {
        /// The root cause of this error.
        source: zip::result::ZipError,
        /// The path responsible for triggering the error, if applicable.
        path: Option<PathBuf>,
    },
}

impl ArchiveError {
    pub(crate) fn unreadable(source: io::Error, path: Option<PathBuf>) -> Self {
        Self::UnreadableArchive { source, path }
    }

    pub(crate) fn from_zip(error: zip::result::ZipError, path: Option<PathBuf>) -> Self {
        match error {
            zip::result::ZipError::Io(source) => Self::UnreadableArchive { source, path },
            source => Self::UnsupportedFormat { source, path },
        }
    }
}

impl From<ArchiveError> for ResourceError {
    fn from(error: ArchiveError) -> Self {
        match error {
            ArchiveError::UnreadableArchive { source, .. } => ResourceError::from_io(source),
            error @ ArchiveError::UnsupportedFormat { .. } => ResourceError::wrap(error),
        }
    }
}
