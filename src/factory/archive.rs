use crate::container::{Container, ZipContainer};
use crate::factory::{
    ArchiveFactory, ContainerFactory, FactoryError, FactoryResult, FileResourceFactory,
    ResourceFactory,
};
use crate::resource::Resource;
use async_trait::async_trait;
use std::path::Path;

/// Opens ZIP archives, such as EPUB files, as a [`ZipContainer`].
///
/// A resource reporting a [`file_path`](Resource::file_path) is opened directly from
/// the file system, otherwise its content is read into memory first.
/// The [`source`](Resource::source) is never used to locate the archive, as it may
/// not match the content (e.g., a [`FallbackResource`](crate::resource::FallbackResource)).
#[derive(Copy, Clone, Debug, Default)]
pub struct ZipArchiveFactory;

#[async_trait]
impl ArchiveFactory for ZipArchiveFactory {
    async fn create(
        &self,
        resource: &mut dyn Resource,
        password: Option<&str>,
    ) -> FactoryResult<Box<dyn Container>> {
        if password.is_some() {
            return Err(FactoryError::PasswordsNotSupported);
        }

        if let Some(path) = resource.file_path().map(Path::to_path_buf)
            && tokio::fs::metadata(&path)
                .await
                .is_ok_and(|metadata| metadata.is_file())
        {
            return Ok(Box::new(ZipContainer::open(path).await?));
        }

        let bytes = resource.read(None).await?;
        Ok(Box::new(ZipContainer::from_bytes(bytes).await?))
    }
}

/// A [`ContainerFactory`] creating the resource at a URL with a [`ResourceFactory`],
/// then opening it as an archive with an [`ArchiveFactory`].
///
/// The [default](Default) reads local ZIP files through [`FileResourceFactory`]
/// and [`ZipArchiveFactory`].
pub struct ArchiveContainerFactory {
    resources: Box<dyn ResourceFactory>,
    archives: Box<dyn ArchiveFactory>,
}

impl ArchiveContainerFactory {
    /// Creates a factory chaining `resources` into `archives`.
    pub fn new(
        resources: impl ResourceFactory + 'static,
        archives: impl ArchiveFactory + 'static,
    ) -> Self {
        Self {
            resources: Box::new(resources),
            archives: Box::new(archives),
        }
    }
}

impl Default for ArchiveContainerFactory {
    fn default() -> Self {
        Self::new(FileResourceFactory, ZipArchiveFactory)
    }
}

#[async_trait]
impl ContainerFactory for ArchiveContainerFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Container>> {
        let mut resource = self.resources.create(url).await?;
        let container = self.archives.create(resource.as_mut(), None).await;
        resource.close().await;

        container.map_err(|error| match error {
            FactoryError::FormatNotSupported(_) => FactoryError::NotAContainer {
                url: url.to_owned(),
            },
            error => error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveContainerFactory, ZipArchiveFactory};
    use crate::container::Container;
    use crate::factory::{ArchiveFactory, ContainerFactory, FactoryError};
    use crate::resource::{BytesResource, FileResource, Resource, ResourceError, ResourceExt};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn archive() -> Vec<u8> {
        archive_with("mimetype")
    }

    fn archive_with(name: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_from_memory() {
        let mut resource = BytesResource::new(archive());
        let container = ZipArchiveFactory.create(&mut resource, None).await.unwrap();

        assert_eq!(None, container.source());
        let mut mimetype = container.get("mimetype");
        assert_eq!("application/epub+zip", mimetype.read_to_string().await.unwrap());
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, archive()).unwrap();

        let mut resource = FileResource::new(&path);
        let container = ZipArchiveFactory.create(&mut resource, None).await.unwrap();
        assert_eq!(Some(path.to_str().unwrap()), container.source());

        // Transformed content is never read back from the file system
        let mut transformed = FileResource::new(&path).transform(Ok);
        let container = ZipArchiveFactory.create(&mut transformed, None).await.unwrap();
        assert_eq!(None, container.source());
    }

    #[tokio::test]
    async fn test_source_does_not_locate_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, archive()).unwrap();

        // The content is read even though the source names an existing archive
        let mut resource =
            BytesResource::new(archive_with("other.txt")).with_source(path.to_str().unwrap());
        let container = ZipArchiveFactory.create(&mut resource, None).await.unwrap();
        let entries = container.entries().await.unwrap();

        assert!(entries.contains("/other.txt"));
        assert!(!entries.contains("/mimetype"));
    }

    #[tokio::test]
    async fn test_fallback_resource_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut resource = FileResource::new(dir.path().join("missing.epub")).fallback(|_| {
            Some(Box::new(BytesResource::new(archive_with("fallback.txt"))) as Box<dyn Resource>)
        });
        let container = ZipArchiveFactory.create(&mut resource, None).await.unwrap();
        assert!(container.entries().await.unwrap().contains("/fallback.txt"));
    }

    #[tokio::test]
    async fn test_failures() {
        let mut resource = BytesResource::new(archive());
        let result = ZipArchiveFactory.create(&mut resource, Some("secret")).await;
        assert!(matches!(result, Err(FactoryError::PasswordsNotSupported)));

        let mut resource = BytesResource::new("not a zip archive");
        let result = ZipArchiveFactory.create(&mut resource, None).await;
        assert!(matches!(result, Err(FactoryError::FormatNotSupported(_))));

        let mut resource = FileResource::new("/missing/book.epub");
        let result = ZipArchiveFactory.create(&mut resource, None).await;
        assert!(matches!(
            result,
            Err(FactoryError::ResourceReading(ResourceError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_archive_container_factory() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        let text = dir.path().join("notes.txt");
        std::fs::write(&epub, archive()).unwrap();
        std::fs::write(&text, "not a zip archive").unwrap();

        let factory = ArchiveContainerFactory::default();
        let container = factory.create(epub.to_str().unwrap()).await.unwrap();
        assert!(container.entries().await.unwrap().contains("/mimetype"));

        let result = factory.create(text.to_str().unwrap()).await;
        assert!(matches!(result, Err(FactoryError::NotAContainer { .. })));
    }
}
