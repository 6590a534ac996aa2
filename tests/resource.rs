use async_trait::async_trait;
use lectern::resource::{
    BufferingResource, ByteRange, BytesResource, FailureResource, FallbackResource, FileResource,
    LazyResource, Resource, ResourceError, ResourceExt, ResourceResult, TransformingResource,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts the physical reads of a wrapped in-memory resource.
struct CountingResource {
    inner: BytesResource,
    reads: Arc<AtomicUsize>,
}

impl CountingResource {
    fn new(data: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let resource = Self {
            inner: BytesResource::new(data),
            reads: Arc::clone(&reads),
        };
        (resource, reads)
    }
}

#[async_trait]
impl Resource for CountingResource {
    async fn length(&mut self) -> ResourceResult<u64> {
        self.inner.length().await
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(range).await
    }
}

fn data(length: usize) -> Vec<u8> {
    (0..length).map(|i| (i % 251) as u8).collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_out_of_range_reads_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c1.xhtml");
    std::fs::write(&path, data(100)).unwrap();

    let resources: Vec<Box<dyn Resource>> = vec![
        Box::new(BytesResource::new(data(100))),
        Box::new(FileResource::new(&path)),
        Box::new(BufferingResource::new(BytesResource::new(data(100))).chunk_size(16)),
        Box::new(TransformingResource::new(BytesResource::new(data(100)), Ok)),
    ];

    for mut resource in resources {
        assert_eq!(100, resource.length().await.unwrap());
        assert!(resource.read(Some(100..200)).await.unwrap().is_empty());
        assert!(resource.read(Some(500..501)).await.unwrap().is_empty());
        assert!(resource.read(Some(60..40)).await.unwrap().is_empty());
        assert_eq!(&data(100)[90..], resource.read(Some(90..1000)).await.unwrap());
        resource.close().await;
    }
}

#[tokio::test]
async fn test_file_resource() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("style.css");
    std::fs::write(&path, "p { margin: 0 }").unwrap();

    let mut resource = FileResource::new(&path);
    assert_eq!(Some(path.to_str().unwrap()), resource.source());
    assert_eq!(Some("style.css".to_owned()), resource.name().await.unwrap());
    assert_eq!(Some(lectern::MediaType::CSS), resource.media_type().await.unwrap());
    assert_eq!(b"margin", resource.read(Some(4..10)).await.unwrap().as_slice());
    assert_eq!("p { margin: 0 }", resource.read_to_string().await.unwrap());

    resource.close().await;
    resource.close().await;

    let mut missing = FileResource::new(dir.path().join("missing.css"));
    assert!(matches!(missing.read(None).await, Err(ResourceError::NotFound(_))));
}

#[tokio::test]
async fn test_file_resource_from_open_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c1.xhtml");
    std::fs::write(&path, data(5_000)).unwrap();

    let file = tokio::fs::File::open(&path).await.unwrap();
    // Reads go through the handle, which outlives the directory entry on unix
    #[cfg(unix)]
    std::fs::remove_file(&path).unwrap();

    let mut resource = FileResource::from_file(&path, file);
    assert_eq!(Some(path.to_str().unwrap()), resource.source());
    assert_eq!(Some(lectern::MediaType::XHTML), resource.media_type().await.unwrap());
    assert_eq!(5_000, resource.length().await.unwrap());
    assert_eq!(&data(5_000)[4_000..4_100], resource.read(Some(4_000..4_100)).await.unwrap());
    assert_eq!(&data(5_000)[10..20], resource.read(Some(10..20)).await.unwrap());
    assert_eq!(data(5_000), resource.read(None).await.unwrap());
    assert!(resource.read(Some(5_000..6_000)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_buffering_sequential_reads() {
    let expected = data(20_000);
    let (inner, reads) = CountingResource::new(expected.clone());
    let mut resource = BufferingResource::new(inner).with_length(20_000);

    // Forward reads within the first chunk cost a single physical read
    for start in (0..8000).step_by(100) {
        let bytes = resource.read(Some(start..start + 100)).await.unwrap();
        assert_eq!(&expected[start as usize..start as usize + 100], bytes);
    }
    assert_eq!(1, reads.load(Ordering::SeqCst));

    // Crossing the chunk boundary only reads the missing suffix
    let bytes = resource.read(Some(8000..8300)).await.unwrap();
    assert_eq!(&expected[8000..8300], bytes);
    assert_eq!(2, reads.load(Ordering::SeqCst));

    // Full reads bypass the buffer
    assert_eq!(expected, resource.read(None).await.unwrap());
    assert_eq!(3, reads.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_fallback_single_attempt() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invocations);

    let primary = FailureResource::new(ResourceError::not_found("primary"));
    let mut resource = FallbackResource::new(primary, move |error| {
        counter.fetch_add(1, Ordering::SeqCst);
        assert!(matches!(error, ResourceError::NotFound(_)));
        Some(Box::new(FailureResource::new(ResourceError::forbidden("fallback"))))
    });

    // The fallback error is reported, not the primary one
    assert!(matches!(resource.read(None).await, Err(ResourceError::Forbidden(_))));
    assert!(matches!(resource.length().await, Err(ResourceError::Forbidden(_))));
    assert!(resource.is_fallen_back());
    assert_eq!(1, invocations.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_fallback() {
    let mut untouched = FallbackResource::new(BytesResource::new("primary"), |_| {
        panic!("the primary resource does not fail")
    });
    assert_eq!("primary", untouched.read_to_string().await.unwrap());
    assert!(!untouched.is_fallen_back());

    let mut recovered = FailureResource::new(ResourceError::Offline)
        .fallback(|_| Some(Box::new(BytesResource::new("cached"))));
    assert_eq!(b"ach", recovered.read(Some(1..4)).await.unwrap().as_slice());
    assert!(recovered.is_fallen_back());

    let mut unrecoverable = FallbackResource::new(
        FailureResource::new(ResourceError::not_found("primary")),
        |_| None,
    );
    assert!(matches!(unrecoverable.read(None).await, Err(ResourceError::NotFound(_))));
    assert!(!unrecoverable.is_fallen_back());
}

#[tokio::test]
async fn test_lazy_resource() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);

    let mut resource = LazyResource::new(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::new(BytesResource::new("lazy")) as Box<dyn Resource>
    });

    // Closing an unused resource does not create it
    resource.close().await;
    assert_eq!(0, created.load(Ordering::SeqCst));

    let mut resource = LazyResource::new(|| async {
        Box::new(BytesResource::new("lazy")) as Box<dyn Resource>
    });
    assert_eq!(4, resource.length().await.unwrap());
    assert_eq!("lazy", resource.read_to_string().await.unwrap());
    assert!(resource.is_initialized());
}

#[tokio::test]
async fn test_transforming_resource() {
    let transforms = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&transforms);
    let uppercase = move |bytes: Vec<u8>| -> ResourceResult<Vec<u8>> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(bytes.to_ascii_uppercase())
    };

    let mut resource = BytesResource::new("chapter").transform(uppercase.clone());
    assert_eq!(b"HAP", resource.read(Some(1..4)).await.unwrap().as_slice());
    assert_eq!(7, resource.length().await.unwrap());
    assert_eq!("CHAPTER", resource.read_to_string().await.unwrap());
    assert_eq!(1, transforms.load(Ordering::SeqCst));

    let mut uncached =
        TransformingResource::new(BytesResource::new("chapter"), uppercase).cache_bytes(false);
    uncached.read(Some(0..1)).await.unwrap();
    uncached.read(Some(1..2)).await.unwrap();
    assert_eq!(3, transforms.load(Ordering::SeqCst));

    let mut failing = BytesResource::new("chapter")
        .transform(|_| Err(ResourceError::other("cannot decrypt")));
    assert!(matches!(failing.read(None).await, Err(ResourceError::Other(_))));
    assert_eq!(None, failing.source());
}

#[tokio::test]
async fn test_synchronized_resource() {
    let resource = BytesResource::new(data(1000)).synchronized();

    let tasks = (0..10u64)
        .map(|i| {
            let mut resource = resource.clone();
            tokio::spawn(async move { resource.read(Some(i * 100..(i + 1) * 100)).await })
        })
        .collect::<Vec<_>>();

    let mut content = Vec::new();
    for task in tasks {
        content.extend(task.await.unwrap().unwrap());
    }
    assert_eq!(data(1000), content);
}

#[tokio::test]
async fn test_read_to_string() {
    let mut utf16 = BytesResource::new(b"\xFF\xFEh\x00i\x00".to_vec());
    assert_eq!("hi", utf16.read_to_string().await.unwrap());

    let mut bom = BytesResource::new(b"\xEF\xBB\xBFhi".to_vec());
    assert_eq!("hi", bom.read_to_string().await.unwrap());

    let mut invalid = BytesResource::new(vec![0xC3, 0x28]);
    assert!(matches!(invalid.read_to_string().await, Err(ResourceError::Other(_))));
}

proptest! {
    #[test]
    fn test_buffering_transparency(
        length in 0usize..5000,
        chunk_size in 1u64..600,
        steps in prop::collection::vec((0u64..300, 0u64..400), 1..40),
    ) {
        let expected = data(length);
        let results = runtime().block_on(async {
            let mut direct = BytesResource::new(expected.clone());
            let mut buffered = BufferingResource::new(BytesResource::new(expected.clone()))
                .chunk_size(chunk_size);

            let mut start = 0;
            let mut results = Vec::new();
            for (gap, size) in steps {
                start += gap;
                let range = start..start + size;
                results.push((
                    direct.read(Some(range.clone())).await.unwrap(),
                    buffered.read(Some(range)).await.unwrap(),
                ));
                start += size;
            }
            results
        });

        for (direct, buffered) in results {
            prop_assert_eq!(direct, buffered);
        }
    }
}
