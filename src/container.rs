//! [`Container`] abstraction: a named collection of [`Resource`] entries.
//!
//! Available containers:
//! - [`DirectoryContainer`]: a directory on the local file system.
//! - [`ZipContainer`]: the entries of a ZIP archive (e.g., an EPUB file).
//! - [`RoutingContainer`]: dispatches paths to sub-containers by predicate.
//! - [`TransformingContainer`]: applies resource transformers to every entry.

mod directory;
pub(crate) mod errors;
mod routing;
mod transforming;
mod zip;

pub use self::{
    directory::DirectoryContainer,
    errors::{ArchiveError, ArchiveResult},
    routing::{Route, RoutingContainer},
    transforming::{ResourceTransformer, TransformingContainer},
    zip::{ZipContainer, ZipEntry},
};

use crate::media_type::MediaType;
use crate::resource::{
    ByteRange, FailureResource, Properties, Resource, ResourceError, ResourceResult,
};
use crate::util::str::StrExt;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::path::Path;

/// A keyed collection of resources, such as a ZIP archive or a directory.
///
/// Paths are rooted at `/` (e.g., `/OEBPS/c1.xhtml`).
///
/// # Fail-lazy access
/// [`Container::get`] never fails: a path that is missing or denied resolves to an
/// [`Entry`] failing on every access with [`ResourceError::NotFound`] or
/// [`ResourceError::Forbidden`], deferring the error to the first read.
#[async_trait]
pub trait Container: Send + Sync {
    /// URL or path of the container, when available.
    fn source(&self) -> Option<&str> {
        None
    }

    /// A consistent snapshot of the paths of every entry,
    /// or [`None`] if the container cannot enumerate its entries.
    async fn entries(&self) -> Option<BTreeSet<String>>;

    /// Returns the entry at the given path.
    fn get(&self, path: &str) -> Entry;

    /// Releases any held system resources, such as archive handles.
    ///
    /// Closing is idempotent; entries handed out afterward or still in use may fail
    /// with [`ResourceError::Unavailable`].
    async fn close(&self) {}
}

#[async_trait]
impl<C: Container + ?Sized> Container for Box<C> {
    fn source(&self) -> Option<&str> {
        (**self).source()
    }

    async fn entries(&self) -> Option<BTreeSet<String>> {
        (**self).entries().await
    }

    fn get(&self, path: &str) -> Entry {
        (**self).get(path)
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[async_trait]
impl<C: Container + ?Sized> Container for std::sync::Arc<C> {
    fn source(&self) -> Option<&str> {
        (**self).source()
    }

    async fn entries(&self) -> Option<BTreeSet<String>> {
        (**self).entries().await
    }

    fn get(&self, path: &str) -> Entry {
        (**self).get(path)
    }

    async fn close(&self) {
        (**self).close().await
    }
}

/// A [`Resource`] held by a [`Container`], addressed by its path.
///
/// Every resource operation is forwarded to the wrapped resource.
pub struct Entry {
    path: String,
    resource: Box<dyn Resource>,
}

impl Entry {
    /// Creates an entry at `path`, which is rooted at `/` if it is not already.
    pub fn new(path: &str, resource: impl Resource + 'static) -> Self {
        Self {
            path: path.rooted(),
            resource: Box::new(resource),
        }
    }

    /// Creates an entry failing every operation with `error`.
    pub fn failure(path: &str, error: ResourceError) -> Self {
        Self::new(path, FailureResource::new(error))
    }

    /// The path of this entry within its container, rooted at `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Unwraps the underlying resource.
    pub fn into_resource(self) -> Box<dyn Resource> {
        self.resource
    }

    /// Unwraps the path and underlying resource.
    pub fn into_parts(self) -> (String, Box<dyn Resource>) {
        (self.path, self.resource)
    }
}

impl Debug for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("path", &self.path)
            .field("source", &self.resource.source())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resource for Entry {
    fn source(&self) -> Option<&str> {
        self.resource.source()
    }

    fn file_path(&self) -> Option<&Path> {
        self.resource.file_path()
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        self.resource.media_type().await
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        self.resource.name().await
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        self.resource.properties().await
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        self.resource.length().await
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        self.resource.read(range).await
    }

    async fn read_to_string(&mut self) -> ResourceResult<String> {
        self.resource.read_to_string().await
    }

    async fn close(&mut self) {
        self.resource.close().await
    }
}
