use crate::media_type::MediaType;
use crate::resource::{self, ByteRange, Properties, Resource, ResourceResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Function rewriting the full content of a resource.
pub type Transform = Box<dyn Fn(Vec<u8>) -> ResourceResult<Vec<u8>> + Send + Sync>;

/// Transforms the bytes of a wrapped [`Resource`] on the fly.
///
/// The whole wrapped resource is read once, transformed, and every range request is then
/// sliced out of the transformed bytes; [`Resource::length`] reflects the transformed size.
/// This can be used to decrypt, deobfuscate, or inject content into HTML documents.
///
/// The transformation runs on the full content, so this is not appropriate for
/// resources too large to be held in memory.
///
/// # Examples
/// ```
/// # use lectern::resource::{BytesResource, Resource, ResourceResult, TransformingResource};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut resource = TransformingResource::new(BytesResource::new("abc"), |bytes| {
///     Ok(bytes.to_ascii_uppercase())
/// });
///
/// assert_eq!(b"BC", resource.read(Some(1..3)).await?.as_slice());
/// assert_eq!(3, resource.length().await?);
/// # Ok(())
/// # }
/// ```
pub struct TransformingResource {
    inner: Box<dyn Resource>,
    transform: Transform,
    cache_bytes: bool,
    bytes: Option<ResourceResult<Arc<[u8]>>>,
}

impl TransformingResource {
    /// Wraps `resource`, transforming its content with `transform`.
    pub fn new<F>(resource: impl Resource + 'static, transform: F) -> Self
    where
        F: Fn(Vec<u8>) -> ResourceResult<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(resource),
            transform: Box::new(transform),
            cache_bytes: true,
            bytes: None,
        }
    }

    /// Whether the transformed bytes are kept after the first access.
    ///
    /// When disabled, every operation reads and transforms the wrapped resource again.
    ///
    /// Default: `true`
    pub fn cache_bytes(mut self, cache_bytes: bool) -> Self {
        self.cache_bytes = cache_bytes;
        self
    }

    async fn bytes(&mut self) -> ResourceResult<Arc<[u8]>> {
        if let Some(bytes) = &self.bytes {
            return bytes.clone();
        }

        let bytes = match self.inner.read(None).await {
            Ok(data) => (self.transform)(data).map(Arc::from),
            Err(error) => Err(error),
        };
        if self.cache_bytes {
            self.bytes = Some(bytes.clone());
        }
        bytes
    }
}

#[async_trait]
impl Resource for TransformingResource {
    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        self.inner.media_type().await
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        self.inner.name().await
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        self.inner.properties().await
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        self.bytes().await.map(|bytes| bytes.len() as u64)
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        let bytes = self.bytes().await?;
        match range {
            Some(range) => resource::slice(&bytes, &range),
            None => Ok(bytes.to_vec()),
        }
    }

    async fn close(&mut self) {
        self.bytes = None;
        self.inner.close().await;
    }
}
