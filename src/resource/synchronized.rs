use crate::media_type::MediaType;
use crate::resource::{ByteRange, Properties, Resource, ResourceResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Protects the access to a wrapped [`Resource`] with a mutex, so that a single
/// instance can be shared between tasks.
///
/// Cloning a [`SynchronizedResource`] creates another handle to the same resource;
/// every operation runs with exclusive access to it.
///
/// # Examples
/// ```
/// # use lectern::resource::{BytesResource, Resource, ResourceResult, SynchronizedResource};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut a = SynchronizedResource::new(BytesResource::new("shared"));
/// let mut b = a.clone();
///
/// let (left, right) = tokio::join!(a.read(Some(0..3)), b.read(Some(3..6)));
/// assert_eq!(b"sha", left?.as_slice());
/// assert_eq!(b"red", right?.as_slice());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SynchronizedResource {
    source: Option<Arc<str>>,
    inner: Arc<Mutex<Box<dyn Resource>>>,
}

impl SynchronizedResource {
    /// Wraps `resource` behind a mutex.
    pub fn new(resource: impl Resource + 'static) -> Self {
        Self {
            source: resource.source().map(Arc::from),
            inner: Arc::new(Mutex::new(Box::new(resource))),
        }
    }
}

#[async_trait]
impl Resource for SynchronizedResource {
    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        self.inner.lock().await.media_type().await
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        self.inner.lock().await.name().await
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        self.inner.lock().await.properties().await
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        self.inner.lock().await.length().await
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        self.inner.lock().await.read(range).await
    }

    async fn close(&mut self) {
        self.inner.lock().await.close().await
    }
}
