use crate::archive::util;
use lectern::container::{
    Container, DirectoryContainer, RoutingContainer, TransformingContainer, ZipContainer,
};
use lectern::resource::{BufferingResource, Resource, ResourceError, ResourceExt};
use lectern::MediaType;
use std::sync::Arc;

#[tokio::test]
async fn test_zip_chunked_reads_match_full_read() {
    let dir = tempfile::tempdir().unwrap();
    let container = ZipContainer::open(util::write_epub(dir.path())).await.unwrap();

    for (name, content, _) in util::entries() {
        let mut entry = container.get(name);
        assert_eq!(content, entry.read(None).await.unwrap(), "{name}");
        assert_eq!(content.len() as u64, entry.length().await.unwrap());

        for chunk_size in [1_000u64, 4_096, 10_000] {
            let mut chunks = Vec::new();
            let mut start = 0;

            while start < content.len() as u64 {
                chunks.extend(entry.read(Some(start..start + chunk_size)).await.unwrap());
                start += chunk_size;
            }
            assert_eq!(content, chunks, "{name} by {chunk_size}");
        }
    }
}

#[tokio::test]
async fn test_zip_random_access() {
    let container = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();
    let content = util::chapter(1, 40_000);
    let mut entry = container.get("/OEBPS/c1.xhtml");

    #[rustfmt::skip]
    let ranges = [
        20_000..20_500,
        100..200,
        39_000..80_000,
        0..1,
        60_000..60_001,
        30_000..30_000,
    ];

    for range in ranges {
        let expected = content
            .get(range.start as usize..(range.end as usize).min(content.len()))
            .unwrap_or_default();
        assert_eq!(expected, entry.read(Some(range.clone())).await.unwrap(), "{range:?}");
    }
}

#[tokio::test]
async fn test_zip_buffered_entry() {
    let container = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();
    let content = util::chapter(2, 3_000);
    let mut entry = BufferingResource::new(container.get("/OEBPS/c2.xhtml")).chunk_size(512);

    let mut read = Vec::new();
    for start in (0..content.len() as u64).step_by(100) {
        read.extend(entry.read(Some(start..start + 100)).await.unwrap());
    }
    assert_eq!(content, read);
}

#[tokio::test]
async fn test_zip_entry_metadata() {
    let container = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();

    let cover = container.entry("OEBPS/images/cover.png").unwrap();
    assert_eq!("/OEBPS/images/cover.png", cover.path());
    assert_eq!(None, cover.compressed_length());

    let chapter = container.entry("/OEBPS/c1.xhtml").unwrap();
    assert!(chapter.compressed_length().unwrap() < 40_000);
    assert!(container.entry("/OEBPS/missing.xhtml").is_none());

    let mut entry = container.get("/OEBPS/c1.xhtml");
    assert_eq!(Some(MediaType::XHTML), entry.media_type().await.unwrap());
    assert_eq!(Some("c1.xhtml".to_owned()), entry.name().await.unwrap());

    let archive = entry.properties().await.unwrap().archive().unwrap();
    assert!(archive.is_entry_compressed);
    assert_eq!(chapter.compressed_length(), Some(archive.entry_length));
}

#[tokio::test]
async fn test_concurrent_entries() {
    let container: Arc<dyn Container> =
        Arc::new(ZipContainer::from_bytes(util::epub_bytes()).await.unwrap());

    let tasks = util::entries()
        .into_iter()
        .map(|(name, content, _)| {
            let container = Arc::clone(&container);
            tokio::spawn(async move {
                let mut entry = container.get(name);
                let mut read = Vec::new();
                let mut start = 0;

                while start < content.len() as u64 {
                    read.extend(entry.read(Some(start..start + 777)).await.unwrap());
                    start += 777;
                }
                assert_eq!(content, read, "{name}");
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_directory_matches_zip() {
    let dir = tempfile::tempdir().unwrap();
    let zip = ZipContainer::open(util::write_epub(dir.path())).await.unwrap();
    let directory = DirectoryContainer::open(util::write_directory(dir.path()))
        .await
        .unwrap();

    let entries = zip.entries().await.unwrap();
    assert_eq!(entries, directory.entries().await.unwrap());

    for path in &entries {
        let expected = zip.get(path).read(None).await.unwrap();
        assert_eq!(expected, directory.get(path).read(None).await.unwrap(), "{path}");
    }
}

#[tokio::test]
async fn test_directory_traversal_defense() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    let container = DirectoryContainer::open(util::write_directory(dir.path()))
        .await
        .unwrap();

    for path in ["../../etc/passwd", "../secret.txt", "/OEBPS/../../secret.txt"] {
        let mut entry = container.get(path);
        let result = entry.read(None).await;
        assert!(
            matches!(result, Err(ResourceError::Forbidden(_) | ResourceError::NotFound(_))),
            "{path}"
        );
    }
}

#[tokio::test]
async fn test_routing_local_remote() {
    let dir = tempfile::tempdir().unwrap();
    let local = DirectoryContainer::open(util::write_directory(dir.path()))
        .await
        .unwrap();
    let remote = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();
    let container = RoutingContainer::local_remote(local, remote);

    let mut local_entry = container.get("/mimetype");
    assert_eq!(util::MIMETYPE, local_entry.read_to_string().await.unwrap());

    // Remote URLs are routed to the archive, which has no such entry
    let mut remote_entry = container.get("https://example.org/mimetype");
    assert!(matches!(remote_entry.read(None).await, Err(ResourceError::NotFound(_))));

    container.close().await;
}

#[tokio::test]
async fn test_transforming_container() {
    let zip = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();
    let container = TransformingContainer::new(zip).with_transformer(|path, resource| {
        if path.ends_with(".xhtml") {
            Box::new(resource.transform(|bytes| {
                let html = String::from_utf8(bytes).map_err(ResourceError::wrap)?;
                Ok(html.replace("<body>", "<body><link href=\"reader.css\"/>").into_bytes())
            }))
        } else {
            resource
        }
    });

    let mut chapter = container.get("/OEBPS/c2.xhtml");
    let html = chapter.read_to_string().await.unwrap();
    assert!(html.starts_with("<html><body><link href=\"reader.css\"/><h1>Chapter 2</h1>"));
    assert_eq!(html.len() as u64, chapter.length().await.unwrap());

    let mut mimetype = container.get("/mimetype");
    assert_eq!(util::MIMETYPE, mimetype.read_to_string().await.unwrap());
}

#[tokio::test]
async fn test_closed_zip_container() {
    let container = ZipContainer::from_bytes(util::epub_bytes()).await.unwrap();
    let mut entry = container.get("/OEBPS/c1.xhtml");
    entry.read(Some(0..10)).await.unwrap();

    container.close().await;
    assert!(matches!(entry.read(Some(10..20)).await, Err(ResourceError::Unavailable(_))));
    assert!(matches!(
        container.get("/mimetype").read(None).await,
        Err(ResourceError::Unavailable(_))
    ));
}
