use crate::container::{Container, Entry};
use crate::resource::Resource;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

/// Rewrites the resource of an entry, given its path.
///
/// A transformer which does not apply to a resource returns it unchanged.
pub type ResourceTransformer =
    Box<dyn Fn(&str, Box<dyn Resource>) -> Box<dyn Resource> + Send + Sync>;

/// Applies [`ResourceTransformer`]s to every entry of a [`Container`],
/// such as deobfuscating fonts or injecting styles into HTML documents.
///
/// Transformers are applied in order, each receiving the output of the previous one.
///
/// # Examples
/// ```
/// # use lectern::container::{Container, DirectoryContainer, TransformingContainer};
/// # use lectern::resource::{Resource, ResourceExt};
/// # async fn example(container: DirectoryContainer) {
/// let container = TransformingContainer::new(container).with_transformer(|path, resource| {
///     if path.ends_with(".css") {
///         Box::new(resource.transform(|bytes| Ok(bytes.to_ascii_uppercase())))
///     } else {
///         resource
///     }
/// });
/// # }
/// ```
pub struct TransformingContainer {
    inner: Box<dyn Container>,
    transformers: Vec<ResourceTransformer>,
}

impl TransformingContainer {
    /// Creates a container without transformers, serving the entries of `container` as is.
    pub fn new(container: impl Container + 'static) -> Self {
        Self {
            inner: Box::new(container),
            transformers: Vec::new(),
        }
    }

    /// Appends a transformer, applied after the ones already registered.
    pub fn with_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&str, Box<dyn Resource>) -> Box<dyn Resource> + Send + Sync + 'static,
    {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Appends several transformers in order.
    pub fn with_transformers(
        mut self,
        transformers: impl IntoIterator<Item = ResourceTransformer>,
    ) -> Self {
        self.transformers.extend(transformers);
        self
    }
}

impl Debug for TransformingContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformingContainer")
            .field("source", &self.inner.source())
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

#[async_trait]
impl Container for TransformingContainer {
    fn source(&self) -> Option<&str> {
        self.inner.source()
    }

    async fn entries(&self) -> Option<BTreeSet<String>> {
        self.inner.entries().await
    }

    fn get(&self, path: &str) -> Entry {
        let (path, resource) = self.inner.get(path).into_parts();
        let resource = self
            .transformers
            .iter()
            .fold(resource, |resource, transform| transform(&path, resource));

        Entry { path, resource }
    }

    async fn close(&self) {
        self.inner.close().await
    }
}
