use crate::media_type::MediaType;
use crate::resource::{self, ByteRange, Properties, Resource, ResourceResult};
use async_trait::async_trait;
use std::sync::Arc;

/// A [`Resource`] serving a fixed in-memory buffer.
///
/// # Examples
/// ```
/// # use lectern::MediaType;
/// # use lectern::resource::{BytesResource, Resource, ResourceResult};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut resource = BytesResource::new("<p>Hello</p>")
///     .with_media_type(MediaType::HTML)
///     .with_source("memory://hello.html");
///
/// assert_eq!(Some("memory://hello.html"), resource.source());
/// assert_eq!(Some(MediaType::HTML), resource.media_type().await?);
/// assert_eq!("<p>Hello</p>", resource.read_to_string().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct BytesResource {
    bytes: Arc<[u8]>,
    source: Option<String>,
    media_type: Option<MediaType>,
    properties: Properties,
}

impl BytesResource {
    /// Creates a resource over the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self::shared(Arc::from(bytes.into()))
    }

    /// Creates a resource over shared bytes without copying them.
    pub fn shared(bytes: Arc<[u8]>) -> Self {
        Self {
            bytes,
            source: None,
            media_type: None,
            properties: Properties::new(),
        }
    }

    /// Sets the reported [`Resource::source`].
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the reported [`Resource::media_type`].
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Sets the reported [`Resource::properties`].
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

#[async_trait]
impl Resource for BytesResource {
    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        let guessed = || self.source.as_deref().and_then(MediaType::from_path);
        Ok(self.media_type.clone().or_else(guessed))
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        Ok(self.properties.clone())
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        Ok(self.bytes.len() as u64)
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        match range {
            Some(range) => resource::slice(&self.bytes, &range),
            None => Ok(self.bytes.to_vec()),
        }
    }
}
