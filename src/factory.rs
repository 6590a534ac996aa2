//! Factories opening a [`Resource`] or [`Container`] from a URL.
//!
//! Each kind of factory has a composite, trying a primary factory first and a
//! fallback factory when the primary fails:
//! - [`CompositeResourceFactory`]
//! - [`CompositeContainerFactory`]
//! - [`CompositeArchiveFactory`]
//!
//! # Examples
//! - Opening a publication which is either an unpacked directory or a ZIP archive:
//! ```no_run
//! # use lectern::container::Container;
//! # use lectern::factory::{
//! #     ArchiveContainerFactory, CompositeContainerFactory, ContainerFactory,
//! #     DirectoryContainerFactory,
//! # };
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = CompositeContainerFactory::new(
//!     DirectoryContainerFactory,
//!     ArchiveContainerFactory::default(),
//! );
//! let container = factory.create("file:///books/moby-dick.epub").await?;
//! let entries = container.entries().await;
//! # Ok(())
//! # }
//! ```

mod archive;
pub(crate) mod errors;
mod file;

pub use self::{
    archive::{ArchiveContainerFactory, ZipArchiveFactory},
    errors::{FactoryError, FactoryResult},
    file::{DirectoryContainerFactory, FileResourceFactory},
};

use crate::container::Container;
use crate::resource::Resource;
use async_trait::async_trait;

/// Creates a [`Resource`] from a URL.
#[async_trait]
pub trait ResourceFactory: Send + Sync {
    /// Creates the resource at `url`.
    ///
    /// Unsupported URL schemes fail with [`FactoryError::SchemeNotSupported`].
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Resource>>;
}

/// Creates a [`Container`] from a URL.
#[async_trait]
pub trait ContainerFactory: Send + Sync {
    /// Creates the container at `url`.
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Container>>;
}

/// Opens a [`Resource`] holding an archive as a [`Container`] of its entries.
#[async_trait]
pub trait ArchiveFactory: Send + Sync {
    /// Opens `resource` as an archive, unlocked with `password` when given.
    ///
    /// Resources which are not archives of a supported format fail with
    /// [`FactoryError::FormatNotSupported`].
    async fn create(
        &self,
        resource: &mut dyn Resource,
        password: Option<&str>,
    ) -> FactoryResult<Box<dyn Container>>;
}

/// Tries a primary [`ResourceFactory`], falling back to another on any failure.
pub struct CompositeResourceFactory {
    primary: Box<dyn ResourceFactory>,
    fallback: Box<dyn ResourceFactory>,
}

impl CompositeResourceFactory {
    /// Creates a factory trying `primary` and then `fallback`.
    pub fn new(
        primary: impl ResourceFactory + 'static,
        fallback: impl ResourceFactory + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

#[async_trait]
impl ResourceFactory for CompositeResourceFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Resource>> {
        match self.primary.create(url).await {
            Ok(resource) => Ok(resource),
            Err(error) => {
                tracing::debug!(%error, url, "primary resource factory failed; trying fallback");
                self.fallback.create(url).await
            }
        }
    }
}

/// Tries a primary [`ContainerFactory`], falling back to another on any failure.
pub struct CompositeContainerFactory {
    primary: Box<dyn ContainerFactory>,
    fallback: Box<dyn ContainerFactory>,
}

impl CompositeContainerFactory {
    /// Creates a factory trying `primary` and then `fallback`.
    pub fn new(
        primary: impl ContainerFactory + 'static,
        fallback: impl ContainerFactory + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

#[async_trait]
impl ContainerFactory for CompositeContainerFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Container>> {
        match self.primary.create(url).await {
            Ok(container) => Ok(container),
            Err(error) => {
                tracing::debug!(%error, url, "primary container factory failed; trying fallback");
                self.fallback.create(url).await
            }
        }
    }
}

/// Tries a primary [`ArchiveFactory`], falling back to another on any failure.
pub struct CompositeArchiveFactory {
    primary: Box<dyn ArchiveFactory>,
    fallback: Box<dyn ArchiveFactory>,
}

impl CompositeArchiveFactory {
    /// Creates a factory trying `primary` and then `fallback`.
    pub fn new(
        primary: impl ArchiveFactory + 'static,
        fallback: impl ArchiveFactory + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

#[async_trait]
impl ArchiveFactory for CompositeArchiveFactory {
    async fn create(
        &self,
        resource: &mut dyn Resource,
        password: Option<&str>,
    ) -> FactoryResult<Box<dyn Container>> {
        match self.primary.create(resource, password).await {
            Ok(container) => Ok(container),
            Err(error) => {
                tracing::debug!(
                    %error,
                    source = resource.source(),
                    "primary archive factory failed; trying fallback"
                );
                self.fallback.create(resource, password).await
            }
        }
    }
}
