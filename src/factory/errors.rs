use crate::container::ArchiveError;
use crate::resource::{Cause, ResourceError};
use std::io;
use std::sync::Arc;

/// Alias for `Result<T, FactoryError>`.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Possible errors when creating a resource or container from a
/// [factory](crate::factory).
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone)]
pub enum FactoryError {
    /// The scheme of the URL (e.g., `http`) is not handled by the factory.
    #[error("[SchemeNotSupported]: `{scheme}` URLs are not supported")]
    SchemeNotSupported {
        /// The rejected scheme.
        scheme: String,
    },

    /// The content is not in a format the factory supports, such as a resource
    /// given to an archive factory which is not a ZIP archive.
    #[error("[FormatNotSupported]: {0}")]
    FormatNotSupported(Cause),

    /// The URL does not point to a container, such as a plain file given to a
    /// directory factory.
    #[error("[NotAContainer]: `{url}` is not a container")]
    NotAContainer {
        /// The rejected URL.
        url: String,
    },

    /// The archive requires a password, which the factory cannot handle.
    #[error("[PasswordsNotSupported]: Password protected archives are not supported")]
    PasswordsNotSupported,

    /// The content could not be read while probing it.
    #[error("[ResourceReading]: {0}")]
    ResourceReading(#[from] ResourceError),

    /// Access to the content is denied.
    #[error("[Forbidden]: {0}")]
    Forbidden(Cause),
}

impl FactoryError {
    pub(crate) fn scheme_not_supported(url: &str) -> Self {
        Self::SchemeNotSupported {
            scheme: crate::util::uri::scheme(url).unwrap_or(url).to_owned(),
        }
    }

    pub(crate) fn from_io(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::Forbidden(Arc::new(error)),
            _ => Self::ResourceReading(ResourceError::from_io(error)),
        }
    }
}

impl From<ArchiveError> for FactoryError {
    fn from(error: ArchiveError) -> Self {
        match error {
            ArchiveError::UnreadableArchive { source, .. } => Self::from_io(source),
            error @ ArchiveError::UnsupportedFormat { .. } => {
                Self::FormatNotSupported(Arc::new(error))
            }
        }
    }
}
