use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::Arc;

/// Shared, cloneable cause of a [`ResourceError`].
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Alias for `Result<T, ResourceError>`.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors occurring while accessing a [`Resource`](super::Resource).
///
/// The taxonomy is closed: every failure crossing the resource and container
/// boundary is classified into one of these variants, either at the edge of a
/// primitive through [`ResourceError::from_io`] or through [`ResourceError::wrap`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ResourceError {
    /// The request is malformed, such as a range or parameter the resource cannot honor.
    ///
    /// Equivalent to a 400 HTTP error.
    #[error("[BadRequest]: {message}")]
    BadRequest {
        /// Description of the rejected request.
        message: String,
    },

    /// The resource does not exist.
    ///
    /// Equivalent to a 404 HTTP error.
    #[error("[NotFound]{}", Reason(.0))]
    NotFound(Option<Cause>),

    /// Access to the resource is denied, such as a path escaping its container
    /// or content protected by a DRM that is not unlocked.
    ///
    /// Equivalent to a 403 HTTP error.
    #[error("[Forbidden]{}", Reason(.0))]
    Forbidden(Option<Cause>),

    /// The source can't be reached, typically a transient I/O issue.
    ///
    /// Equivalent to a 503 HTTP error.
    #[error("[Unavailable]{}", Reason(.0))]
    Unavailable(Option<Cause>),

    /// The network connection appears to be offline.
    #[error("[Offline]: The network connection appears to be offline")]
    Offline,

    /// The requested content is too large to be held in memory.
    ///
    /// Equivalent to a 507 HTTP error.
    #[error("[OutOfMemory]: {0}")]
    OutOfMemory(Cause),

    /// Any other error.
    #[error("[Other]: {0}")]
    Other(Cause),
}

impl ResourceError {
    /// Creates a [`ResourceError::NotFound`] with a descriptive message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(Some(message_cause(message)))
    }

    /// Creates a [`ResourceError::Forbidden`] with a descriptive message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(Some(message_cause(message)))
    }

    /// Creates a [`ResourceError::Unavailable`] with a descriptive message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(Some(message_cause(message)))
    }

    /// Creates a [`ResourceError::Other`] with a descriptive message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message_cause(message))
    }

    /// Classifies an unexpected fault.
    ///
    /// - An existing [`ResourceError`] is returned as is.
    /// - Allocation failures become [`ResourceError::OutOfMemory`].
    /// - Everything else becomes [`ResourceError::Other`].
    pub fn wrap(cause: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        let cause = cause.into();

        let cause = match cause.downcast::<ResourceError>() {
            Ok(error) => return *error,
            Err(cause) => cause,
        };
        if cause.is::<TryReserveError>() {
            return Self::OutOfMemory(Arc::from(cause));
        }
        match cause.downcast::<io::Error>() {
            Ok(error) if error.kind() == io::ErrorKind::OutOfMemory => {
                Self::OutOfMemory(Arc::new(*error))
            }
            Ok(error) => Self::Other(Arc::new(*error)),
            Err(cause) => Self::Other(Arc::from(cause)),
        }
    }

    /// Classifies an I/O fault raised by a file or archive primitive.
    pub fn from_io(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(Some(Arc::new(error))),
            io::ErrorKind::PermissionDenied => Self::Forbidden(Some(Arc::new(error))),
            io::ErrorKind::OutOfMemory => Self::OutOfMemory(Arc::new(error)),
            _ => Self::Unavailable(Some(Arc::new(error))),
        }
    }
}

impl From<io::Error> for ResourceError {
    fn from(error: io::Error) -> Self {
        Self::from_io(error)
    }
}

impl From<TryReserveError> for ResourceError {
    fn from(error: TryReserveError) -> Self {
        Self::OutOfMemory(Arc::new(error))
    }
}

fn message_cause(message: impl Into<String>) -> Cause {
    Arc::from(Box::<dyn Error + Send + Sync>::from(message.into()))
}

struct Reason<'a>(&'a Option<Cause>);

impl Display for Reason<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(cause) => write!(f, ": {cause}"),
            None => Ok(()),
        }
    }
}
