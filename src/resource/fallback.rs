use crate::media_type::MediaType;
use crate::resource::{ByteRange, Properties, Resource, ResourceError, ResourceResult};
use async_trait::async_trait;

/// Provides a substitute resource for the error raised by the primary resource,
/// or [`None`] if the error is not recoverable.
pub type FallbackFactory = Box<dyn FnOnce(&ResourceError) -> Option<Box<dyn Resource>> + Send>;

/// Runs `$op` against the active resource, switching to the fallback resource
/// on the first failure of the primary one.
macro_rules! with_fallback {
    ($self:ident, |$resource:ident| $op:expr) => {{
        match &mut $self.fallback {
            Some($resource) => $op,
            None => {
                let result = {
                    let $resource = &mut $self.primary;
                    $op
                };
                match result {
                    Err(error) => match $self.switch_to_fallback(&error) {
                        Some($resource) => $op,
                        None => Err(error),
                    },
                    success => success,
                }
            }
        }
    }};
}

/// A [`Resource`] acting as a proxy to a fallback resource if the primary resource
/// errors out.
///
/// On the first failure of any operation, the factory is asked for a substitute keyed
/// by the specific error. When one is given, this resource permanently switches to it
/// and retries the operation; otherwise the original error is propagated.
/// The factory is invoked at most once per instance.
///
/// # Examples
/// ```
/// # use lectern::resource::{
/// #     BytesResource, FailureResource, FallbackResource, Resource, ResourceError, ResourceResult,
/// # };
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let primary = FailureResource::new(ResourceError::NotFound(None));
/// let mut resource = FallbackResource::new(primary, |error| match error {
///     ResourceError::NotFound(_) => Some(Box::new(BytesResource::new("placeholder"))),
///     _ => None,
/// });
///
/// assert_eq!("placeholder", resource.read_to_string().await?);
/// # Ok(())
/// # }
/// ```
pub struct FallbackResource {
    primary: Box<dyn Resource>,
    factory: Option<FallbackFactory>,
    fallback: Option<Box<dyn Resource>>,
}

impl FallbackResource {
    /// Wraps `primary`, falling back on the resource provided by `factory`.
    pub fn new<F>(primary: impl Resource + 'static, factory: F) -> Self
    where
        F: FnOnce(&ResourceError) -> Option<Box<dyn Resource>> + Send + 'static,
    {
        Self {
            primary: Box::new(primary),
            factory: Some(Box::new(factory)),
            fallback: None,
        }
    }

    /// Falls back on the given resource whatever the error.
    pub fn with_resource(
        primary: impl Resource + 'static,
        fallback: impl Resource + 'static,
    ) -> Self {
        let fallback: Box<dyn Resource> = Box::new(fallback);
        Self::new(primary, move |_| Some(fallback))
    }

    /// Returns `true` once this resource switched to its fallback.
    pub fn is_fallen_back(&self) -> bool {
        self.fallback.is_some()
    }

    fn switch_to_fallback(&mut self, error: &ResourceError) -> Option<&mut Box<dyn Resource>> {
        let factory = self.factory.take()?;
        let fallback = factory(error)?;

        tracing::debug!(%error, "falling back on a substitute resource");
        Some(self.fallback.insert(fallback))
    }
}

#[async_trait]
impl Resource for FallbackResource {
    fn source(&self) -> Option<&str> {
        match &self.fallback {
            Some(fallback) => fallback.source(),
            None => self.primary.source(),
        }
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        with_fallback!(self, |resource| resource.media_type().await)
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        with_fallback!(self, |resource| resource.name().await)
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        with_fallback!(self, |resource| resource.properties().await)
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        with_fallback!(self, |resource| resource.length().await)
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        with_fallback!(self, |resource| resource.read(range.clone()).await)
    }

    async fn close(&mut self) {
        self.primary.close().await;
        if let Some(fallback) = &mut self.fallback {
            fallback.close().await;
        }
    }
}
