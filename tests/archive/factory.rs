use crate::archive::util;
use async_trait::async_trait;
use lectern::container::Container;
use lectern::factory::{
    ArchiveContainerFactory, ArchiveFactory, CompositeArchiveFactory, CompositeContainerFactory,
    CompositeResourceFactory, ContainerFactory, DirectoryContainerFactory, FactoryError,
    FactoryResult, FileResourceFactory, ResourceFactory, ZipArchiveFactory,
};
use lectern::resource::{BytesResource, Resource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves `https` URLs from memory, counting every creation attempt.
#[derive(Default)]
struct RemoteFactory {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl ResourceFactory for RemoteFactory {
    async fn create(&self, url: &str) -> FactoryResult<Box<dyn Resource>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if url.starts_with("https:") {
            Ok(Box::new(BytesResource::new(util::epub_bytes()).with_source(url)))
        } else {
            Err(FactoryError::SchemeNotSupported {
                scheme: url.split(':').next().unwrap_or_default().to_owned(),
            })
        }
    }
}

/// Rejects every resource as an unsupported format.
struct RejectingArchiveFactory;

#[async_trait]
impl ArchiveFactory for RejectingArchiveFactory {
    async fn create(
        &self,
        _resource: &mut dyn Resource,
        _password: Option<&str>,
    ) -> FactoryResult<Box<dyn Container>> {
        Err(FactoryError::FormatNotSupported(Arc::new(std::io::Error::other(
            "not a RAR archive",
        ))))
    }
}

#[tokio::test]
async fn test_composite_resource_factory() {
    let dir = tempfile::tempdir().unwrap();
    let path = util::write_epub(dir.path());

    let remote = RemoteFactory::default();
    let attempts = Arc::clone(&remote.attempts);
    let factory = CompositeResourceFactory::new(FileResourceFactory, remote);

    // Local paths are handled by the primary factory
    let mut local = factory.create(path.to_str().unwrap()).await.unwrap();
    assert_eq!(util::epub_bytes().len() as u64, local.length().await.unwrap());
    assert_eq!(0, attempts.load(Ordering::SeqCst));

    let mut remote = factory.create("https://example.org/book.epub").await.unwrap();
    assert_eq!(Some("https://example.org/book.epub"), remote.source());
    assert_eq!(util::epub_bytes(), remote.read(None).await.unwrap());
    assert_eq!(1, attempts.load(Ordering::SeqCst));

    // The error of the fallback is reported when both fail
    let result = factory.create("opds://example.org/book.epub").await;
    assert!(matches!(
        result,
        Err(FactoryError::SchemeNotSupported { scheme }) if scheme == "opds"
    ));
    assert_eq!(2, attempts.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_composite_archive_factory() {
    let factory = CompositeArchiveFactory::new(RejectingArchiveFactory, ZipArchiveFactory);
    let mut resource = BytesResource::new(util::epub_bytes());

    let container = factory.create(&mut resource, None).await.unwrap();
    let mut mimetype = container.get("mimetype");
    assert_eq!(util::MIMETYPE, mimetype.read_to_string().await.unwrap());

    let mut not_an_archive = BytesResource::new("plain text");
    let result = factory.create(&mut not_an_archive, None).await;
    assert!(matches!(result, Err(FactoryError::FormatNotSupported(_))));

    let result = factory.create(&mut resource, Some("secret")).await;
    assert!(matches!(result, Err(FactoryError::PasswordsNotSupported)));
}

#[tokio::test]
async fn test_remote_archive_container() {
    let resources = CompositeResourceFactory::new(FileResourceFactory, RemoteFactory::default());
    let factory = ArchiveContainerFactory::new(resources, ZipArchiveFactory);

    let container = factory.create("https://example.org/book.epub").await.unwrap();
    assert_eq!(None, container.source());
    assert_eq!(
        util::entries().len(),
        container.entries().await.unwrap().len()
    );
}

#[tokio::test]
async fn test_directory_or_archive() {
    let dir = tempfile::tempdir().unwrap();
    let epub = util::write_epub(dir.path());
    let unpacked = util::write_directory(dir.path());
    let factory = CompositeContainerFactory::new(
        DirectoryContainerFactory,
        ArchiveContainerFactory::default(),
    );

    for path in [&epub, &unpacked] {
        let container = factory.create(path.to_str().unwrap()).await.unwrap();
        let mut chapter = container.get("/OEBPS/c2.xhtml");

        assert_eq!(util::chapter(2, 3_000), chapter.read(None).await.unwrap(), "{path:?}");
        container.close().await;
    }

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "not an archive").unwrap();

    let result = factory.create(text.to_str().unwrap()).await;
    assert!(matches!(result, Err(FactoryError::NotAContainer { .. })));

    let missing = dir.path().join("missing.epub");
    let result = factory.create(missing.to_str().unwrap()).await;
    assert!(matches!(result, Err(FactoryError::ResourceReading(_))));
}
