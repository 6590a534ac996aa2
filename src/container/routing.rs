use crate::container::{Container, Entry};
use crate::resource::ResourceError;
use crate::util;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// A [`Container`] paired with the predicate selecting the paths it serves.
pub struct Route {
    container: Box<dyn Container>,
    accepts: Predicate,
}

impl Route {
    /// Creates a route serving every path accepted by `accepts` from `container`.
    pub fn new<F>(container: impl Container + 'static, accepts: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            container: Box::new(container),
            accepts: Box::new(accepts),
        }
    }

    /// Returns `true` if this route serves the given path.
    pub fn accepts(&self, path: &str) -> bool {
        (self.accepts)(path)
    }
}

/// Routes each path to the first [`Route`] accepting it.
///
/// A path accepted by no route resolves to an entry failing with
/// [`ResourceError::NotFound`].
///
/// # Examples
/// - Serving local files and remote URLs from different containers:
/// ```no_run
/// # use lectern::container::{Container, DirectoryContainer, RoutingContainer, ZipContainer};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let local = DirectoryContainer::open("assets").await?;
/// let remote = ZipContainer::open("cache.zip").await?;
/// let container = RoutingContainer::local_remote(local, remote);
///
/// let local_entry = container.get("/fonts/serif.otf");
/// let remote_entry = container.get("https://example.org/cover.jpg");
/// # Ok(())
/// # }
/// ```
pub struct RoutingContainer {
    routes: Vec<Route>,
}

impl RoutingContainer {
    /// Creates a container trying `routes` in order.
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// Serves local file paths (no URL scheme, or `file:`) from `local`
    /// and everything else from `remote`.
    pub fn local_remote(
        local: impl Container + 'static,
        remote: impl Container + 'static,
    ) -> Self {
        Self::new([
            Route::new(local, util::uri::is_local_path),
            Route::new(remote, |path| !util::uri::is_local_path(path)),
        ])
    }

    /// The routes, in the order they are tried.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Debug for RoutingContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingContainer")
            .field("routes", &self.routes.len())
            .finish()
    }
}

#[async_trait]
impl Container for RoutingContainer {
    async fn entries(&self) -> Option<BTreeSet<String>> {
        let mut union = None;

        for route in &self.routes {
            if let Some(entries) = route.container.entries().await {
                union.get_or_insert_with(BTreeSet::new).extend(entries);
            }
        }
        union
    }

    fn get(&self, path: &str) -> Entry {
        match self.routes.iter().find(|route| route.accepts(path)) {
            Some(route) => route.container.get(path),
            None => Entry::failure(
                path,
                ResourceError::not_found(format!("no route accepts `{path}`")),
            ),
        }
    }

    async fn close(&self) {
        for route in &self.routes {
            route.container.close().await;
        }
    }
}
