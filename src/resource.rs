//! Format-agnostic [`Resource`] access and its composable decorators.
//!
//! A [`Resource`] is a logical handle to a byte sequence, such as a file on disk,
//! an entry within a ZIP archive, or an in-memory buffer.
//! Decorators take ownership of the resource they wrap and forward every operation
//! they do not override:
//! - [`BufferingResource`]: chunked read-ahead cache for forward sequential reads.
//! - [`TransformingResource`]: content rewriting over the whole resource.
//! - [`FallbackResource`]: error-triggered substitution.
//! - [`LazyResource`]: deferred construction.
//! - [`SynchronizedResource`]: a shareable, mutex-guarded handle.

mod buffering;
mod bytes;
pub(crate) mod errors;
mod failure;
mod fallback;
mod file;
mod lazy;
mod properties;
mod synchronized;
mod transforming;

pub use self::{
    buffering::BufferingResource,
    bytes::BytesResource,
    errors::{Cause, ResourceError, ResourceResult},
    failure::FailureResource,
    fallback::{FallbackFactory, FallbackResource},
    file::FileResource,
    lazy::LazyResource,
    properties::{ArchiveProperties, Properties, PropertyValue},
    synchronized::SynchronizedResource,
    transforming::{Transform, TransformingResource},
};

use crate::media_type::MediaType;
use crate::util;
use async_trait::async_trait;
use std::ops::Range;
use std::path::Path;

/// A half-open byte range (`start..end`) within a resource.
pub type ByteRange = Range<u64>;

/// Acts as a proxy to an actual resource by handling read access.
///
/// Every I/O-bearing operation is asynchronous. Implementations classify every
/// failure into a [`ResourceError`], so low-level faults never cross this boundary.
///
/// # Reading
/// [`Resource::read`] with [`None`] returns the whole content.
/// Out-of-range bounds are clamped to `[0, length)`, and a range that is empty after
/// clamping successfully returns an empty buffer.
///
/// # Examples
/// - Reading an in-memory resource:
/// ```
/// # use lectern::resource::{BytesResource, Resource, ResourceResult};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut resource = BytesResource::new("hello world");
///
/// assert_eq!(b"world", resource.read(Some(6..11)).await?.as_slice());
/// assert_eq!(b"", resource.read(Some(50..60)).await?.as_slice());
/// assert_eq!(11, resource.length().await?);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Resource: Send {
    /// URL or path this resource was read from, when available.
    ///
    /// Decorators which alter the content (e.g., [`TransformingResource`]) do not
    /// expose the source, as the raw bytes would not match.
    fn source(&self) -> Option<&str> {
        None
    }

    /// The local file holding exactly the content of this resource, if any.
    ///
    /// Consumers such as archive readers may open this file directly instead of
    /// reading through the resource. Only primitives backed by a file and pure
    /// forwarding wrappers report one; decorators which alter or substitute the
    /// content do not.
    fn file_path(&self) -> Option<&Path> {
        None
    }

    /// The media type of the content, if known.
    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        Ok(None)
    }

    /// The name of the resource, such as a file name, if any.
    async fn name(&mut self) -> ResourceResult<Option<String>> {
        Ok(None)
    }

    /// Additional metadata, such as [`ArchiveProperties`].
    async fn properties(&mut self) -> ResourceResult<Properties> {
        Ok(Properties::new())
    }

    /// The total length of the content in bytes.
    async fn length(&mut self) -> ResourceResult<u64>;

    /// Reads the bytes at the given range, or everything if `range` is [`None`].
    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>>;

    /// Reads the full content as text.
    ///
    /// UTF-16 content is decoded when a byte order mark is present, otherwise
    /// UTF-8 is assumed.
    async fn read_to_string(&mut self) -> ResourceResult<String> {
        let data = self.read(None).await?;
        util::text::decode(data).map_err(ResourceError::wrap)
    }

    /// Releases any held system resources.
    ///
    /// Closing is idempotent; it is safe to call more than once.
    async fn close(&mut self) {}
}

#[async_trait]
impl<R: Resource + ?Sized> Resource for Box<R> {
    fn source(&self) -> Option<&str> {
        (**self).source()
    }

    fn file_path(&self) -> Option<&Path> {
        (**self).file_path()
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        (**self).media_type().await
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        (**self).name().await
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        (**self).properties().await
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        (**self).length().await
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        (**self).read(range).await
    }

    async fn read_to_string(&mut self) -> ResourceResult<String> {
        (**self).read_to_string().await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Convenience methods to wrap a resource into decorators.
pub trait ResourceExt: Resource + Sized + 'static {
    /// Wraps this resource in a [`BufferingResource`] with the default chunk size.
    fn buffered(self) -> BufferingResource {
        BufferingResource::new(self)
    }

    /// Wraps this resource in a [`FallbackResource`].
    fn fallback<F>(self, factory: F) -> FallbackResource
    where
        F: FnOnce(&ResourceError) -> Option<Box<dyn Resource>> + Send + 'static,
    {
        FallbackResource::new(self, factory)
    }

    /// Wraps this resource in a [`TransformingResource`].
    fn transform<F>(self, transform: F) -> TransformingResource
    where
        F: Fn(Vec<u8>) -> ResourceResult<Vec<u8>> + Send + Sync + 'static,
    {
        TransformingResource::new(self, transform)
    }

    /// Wraps this resource in a shareable [`SynchronizedResource`].
    fn synchronized(self) -> SynchronizedResource {
        SynchronizedResource::new(self)
    }
}

impl<R: Resource + Sized + 'static> ResourceExt for R {}

/// Clamps `range` to `[0, length)`.
///
/// The result is empty if the range starts at or after `length`, or is inverted.
pub fn clamp(range: &ByteRange, length: u64) -> ByteRange {
    let start = range.start.min(length);
    let end = range.end.min(length).max(start);
    start..end
}

/// Slices the clamped `range` out of a fully loaded buffer.
pub(crate) fn slice(data: &[u8], range: &ByteRange) -> ResourceResult<Vec<u8>> {
    let range = clamp(range, data.len() as u64);
    let (start, end) = (to_usize(range.start)?, to_usize(range.end)?);
    Ok(data[start..end].to_vec())
}

/// Allocates a buffer for `length` bytes, reporting allocation failures
/// as [`ResourceError::OutOfMemory`].
pub(crate) fn allocate(length: u64) -> ResourceResult<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(to_usize(length)?)?;
    Ok(buffer)
}

pub(crate) fn to_usize(value: u64) -> ResourceResult<usize> {
    usize::try_from(value).map_err(|_| ResourceError::BadRequest {
        message: format!("`{value}` does not fit in the address space"),
    })
}
