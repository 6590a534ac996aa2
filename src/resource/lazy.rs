use crate::media_type::MediaType;
use crate::resource::{
    ByteRange, FailureResource, Properties, Resource, ResourceError, ResourceResult,
};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

type ResourceFuture = Pin<Box<dyn Future<Output = Box<dyn Resource>> + Send>>;
type Factory = Box<dyn FnOnce() -> ResourceFuture + Send>;

/// Wraps a [`Resource`] which is created only when first accessing one of its members.
///
/// # Examples
/// ```
/// # use lectern::resource::{BytesResource, LazyResource, Resource, ResourceResult};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut resource = LazyResource::new(|| async {
///     Box::new(BytesResource::new("created on demand")) as Box<dyn Resource>
/// });
///
/// assert!(!resource.is_initialized());
/// assert_eq!(17, resource.length().await?);
/// assert!(resource.is_initialized());
/// # Ok(())
/// # }
/// ```
pub struct LazyResource {
    factory: Option<Factory>,
    resource: Option<Box<dyn Resource>>,
}

impl LazyResource {
    /// Creates a resource constructed by `factory` on first access.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Box<dyn Resource>> + Send + 'static,
    {
        Self {
            factory: Some(Box::new(move || Box::pin(factory()) as ResourceFuture)),
            resource: None,
        }
    }

    /// Returns `true` once the wrapped resource has been created.
    pub fn is_initialized(&self) -> bool {
        self.resource.is_some()
    }

    async fn resource(&mut self) -> &mut Box<dyn Resource> {
        if let Some(factory) = self.factory.take() {
            self.resource = Some(factory().await);
        }
        // The factory is only taken together with setting the resource
        self.resource.get_or_insert_with(|| {
            Box::new(FailureResource::new(ResourceError::other(
                "lazy resource has no factory",
            )))
        })
    }
}

#[async_trait]
impl Resource for LazyResource {
    fn source(&self) -> Option<&str> {
        self.resource.as_ref()?.source()
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        self.resource().await.media_type().await
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        self.resource().await.name().await
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        self.resource().await.properties().await
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        self.resource().await.length().await
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        self.resource().await.read(range).await
    }

    async fn close(&mut self) {
        // Never construct the resource only to close it
        if let Some(resource) = &mut self.resource {
            resource.close().await;
        }
    }
}
