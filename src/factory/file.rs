use crate::container::{Container, DirectoryContainer};
use crate::factory::{ContainerFactory, FactoryError, FactoryResult, ResourceFactory};
use crate::resource::{FileResource, Resource};
use crate::util;
use async_trait::async_trait;
use std::path::PathBuf;

/// Creates a [`FileResource`] from a local path or a `file:` URL.
///
/// The file is opened lazily; a missing file fails on first read.
#[derive(Copy, Clone, Debug, Default)]
pub struct FileResourceFactory;

#[async_trait]
impl ResourceFactory for FileResourceFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Resource>> {
        Ok(Box::new(FileResource::new(to_file_path(url)?)))
    }
}

/// Creates a [`DirectoryContainer`] from a local path or a `file:` URL
/// pointing to a directory.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectoryContainerFactory;

#[async_trait]
impl ContainerFactory for DirectoryContainerFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Container>> {
        let path = to_file_path(url)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(FactoryError::from_io)?;

        if !metadata.is_dir() {
            return Err(FactoryError::NotAContainer {
                url: url.to_owned(),
            });
        }
        Ok(Box::new(DirectoryContainer::open(path).await?))
    }
}

fn to_file_path(url: &str) -> FactoryResult<PathBuf> {
    util::uri::to_file_path(url).ok_or_else(|| FactoryError::scheme_not_supported(url))
}
