use crate::container::{ArchiveError, ArchiveResult, Container, Entry};
use crate::resource::{FailureResource, FileResource, LazyResource, Resource, ResourceError};
use crate::util::{self, str::StrExt};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A [`Container`] providing access to the files of a directory on the local file system.
///
/// Paths resolving outside the root directory are rejected with
/// [`ResourceError::Forbidden`], including through symbolic links.
///
/// # Examples
/// ```no_run
/// # use lectern::container::{Container, DirectoryContainer};
/// # use lectern::resource::Resource;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let container = DirectoryContainer::open("extracted_book").await?;
/// let mut entry = container.get("/OEBPS/c1.xhtml");
/// let xhtml = entry.read_to_string().await?;
///
/// // Escaping the root is denied
/// let mut entry = container.get("../../etc/passwd");
/// assert!(entry.read(None).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirectoryContainer {
    root: Arc<Path>,
    source: String,
    entries: BTreeSet<String>,
}

impl DirectoryContainer {
    /// Opens the directory at `root`, walking it to collect its entries.
    ///
    /// Symbolic links are skipped while walking.
    pub async fn open(root: impl AsRef<Path>) -> ArchiveResult<Self> {
        let root = canonicalize_root(root.as_ref()).await?;
        let walk_root = root.clone();
        let entries = tokio::task::spawn_blocking(move || {
            let mut entries = BTreeSet::new();
            traverse(&mut entries, &walk_root, &walk_root).map(|_| entries)
        })
        .await
        .map_err(|error| {
            ArchiveError::unreadable(io::Error::other(error), Some(root.clone()))
        })??;

        tracing::debug!(
            root = %root.display(),
            entries = entries.len(),
            "opened directory container"
        );
        Ok(Self::from_parts(root, entries))
    }

    /// Creates a container over `root` with an already known set of entries,
    /// skipping the directory walk.
    pub async fn with_entries<I, S>(root: impl AsRef<Path>, entries: I) -> ArchiveResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = canonicalize_root(root.as_ref()).await?;
        let entries = entries.into_iter().map(|entry| entry.as_ref().rooted()).collect();
        Ok(Self::from_parts(root, entries))
    }

    fn from_parts(root: PathBuf, entries: BTreeSet<String>) -> Self {
        Self {
            source: root.to_string_lossy().into_owned(),
            root: Arc::from(root),
            entries,
        }
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Container for DirectoryContainer {
    fn source(&self) -> Option<&str> {
        Some(&self.source)
    }

    async fn entries(&self) -> Option<BTreeSet<String>> {
        Some(self.entries.clone())
    }

    fn get(&self, path: &str) -> Entry {
        let Some(segments) = util::uri::normalize(path) else {
            tracing::warn!(path, "rejected path escaping the directory container");
            return Entry::failure(
                path,
                ResourceError::forbidden(format!("`{path}` is outside of the container")),
            );
        };

        let relative = segments.iter().collect::<PathBuf>();
        let root = Arc::clone(&self.root);
        let file = root.join(relative);

        Entry::new(
            path,
            LazyResource::new(move || async move { resolve(&root, file).await }),
        )
    }
}

/// Resolves `file` once accessed, as the file system may change between
/// [`Container::get`] and the first read.
async fn resolve(root: &Path, file: PathBuf) -> Box<dyn Resource> {
    let resolved = match tokio::fs::canonicalize(&file).await {
        Ok(resolved) => resolved,
        Err(error) => return Box::new(FailureResource::new(ResourceError::from_io(error))),
    };

    // Path traversal mitigation
    if !resolved.starts_with(root) {
        tracing::warn!(path = %file.display(), "rejected link escaping the directory container");
        return Box::new(FailureResource::new(ResourceError::forbidden(format!(
            "`{}` is outside of the container",
            file.display()
        ))));
    }

    match tokio::fs::metadata(&resolved).await {
        Ok(metadata) if metadata.is_file() => Box::new(FileResource::new(resolved)),
        Ok(_) => Box::new(FailureResource::new(ResourceError::not_found(format!(
            "`{}` is not a file",
            file.display()
        )))),
        Err(error) => Box::new(FailureResource::new(ResourceError::from_io(error))),
    }
}

async fn canonicalize_root(root: &Path) -> ArchiveResult<PathBuf> {
    let unreadable = |source| ArchiveError::unreadable(source, Some(root.to_path_buf()));
    let dir = tokio::fs::canonicalize(root).await.map_err(unreadable)?;

    match tokio::fs::metadata(&dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(dir),
        Ok(_) => Err(unreadable(io::Error::from(io::ErrorKind::NotADirectory))),
        Err(source) => Err(unreadable(source)),
    }
}

fn traverse(entries: &mut BTreeSet<String>, prefix: &Path, path: &Path) -> ArchiveResult<()> {
    let read_dir = path
        .read_dir()
        .map_err(|error| ArchiveError::unreadable(error, Some(path.to_path_buf())))?;

    for entry in read_dir {
        let entry =
            entry.map_err(|error| ArchiveError::unreadable(error, Some(path.to_path_buf())))?;
        let file_type = entry
            .file_type()
            .map_err(|error| ArchiveError::unreadable(error, Some(entry.path())))?;

        // Symlinks are skipped to avoid escaping the root
        if file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        if file_type.is_dir() {
            traverse(entries, prefix, &path)?;
        } else if let Ok(path) = path.strip_prefix(prefix)
            // Only UTF-8 paths are supported
            && let Some(utf8_path) = path.to_str()
        {
            let value = if cfg!(windows) {
                utf8_path.replace('\\', "/").rooted()
            } else {
                utf8_path.rooted()
            };
            entries.insert(value);
        }
    }
    Ok(())
}
