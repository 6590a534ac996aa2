use crate::resource::{ByteRange, Properties, Resource, ResourceError, ResourceResult};
use async_trait::async_trait;

/// A [`Resource`] failing every operation with the same error.
///
/// Containers hand these out for paths that cannot be served,
/// deferring the error to the first access.
#[derive(Clone, Debug)]
pub struct FailureResource(ResourceError);

impl FailureResource {
    /// Creates a resource that always fails with `error`.
    pub fn new(error: ResourceError) -> Self {
        Self(error)
    }

    /// The error returned by every operation.
    pub fn error(&self) -> &ResourceError {
        &self.0
    }
}

#[async_trait]
impl Resource for FailureResource {
    async fn properties(&mut self) -> ResourceResult<Properties> {
        Err(self.0.clone())
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        Err(self.0.clone())
    }

    async fn read(&mut self, _range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        Err(self.0.clone())
    }
}
