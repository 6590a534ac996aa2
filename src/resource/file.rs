use crate::media_type::MediaType;
use crate::resource::{self, ByteRange, Resource, ResourceError, ResourceResult};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A [`Resource`] reading a file on the local file system.
///
/// The file handle is opened on first access and kept until [`Resource::close`].
/// I/O faults are classified with [`ResourceError::from_io`]; a missing file therefore
/// surfaces as [`ResourceError::NotFound`] on first access rather than on creation.
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    source: String,
    file: Option<File>,
    length: Option<u64>,
}

impl FileResource {
    /// Creates a resource for the file at `path`, opened lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: path.to_string_lossy().into_owned(),
            path,
            file: None,
            length: None,
        }
    }

    /// Creates a resource over an already opened file handle.
    ///
    /// `path` is only used to report the [`source`](Resource::source),
    /// [`name`](Resource::name), and [`media type`](Resource::media_type).
    pub fn from_file(path: impl Into<PathBuf>, file: File) -> Self {
        Self {
            file: Some(file),
            ..Self::new(path)
        }
    }

    /// The path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn file(&mut self) -> ResourceResult<&mut File> {
        match &mut self.file {
            Some(file) => Ok(file),
            file @ None => {
                let opened = File::open(&self.path).await?;
                let metadata = opened.metadata().await?;

                if !metadata.is_file() {
                    return Err(ResourceError::not_found(format!(
                        "`{}` is not a file",
                        self.path.display()
                    )));
                }
                self.length = Some(metadata.len());
                Ok(file.insert(opened))
            }
        }
    }

    async fn read_range(&mut self, range: ByteRange) -> ResourceResult<Vec<u8>> {
        let length = self.length().await?;
        let range = resource::clamp(&range, length);
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let mut buffer = resource::allocate(range.end - range.start)?;
        let file = self.file().await?;
        file.seek(SeekFrom::Start(range.start)).await?;
        file.take(range.end - range.start)
            .read_to_end(&mut buffer)
            .await?;
        Ok(buffer)
    }

    async fn read_all(&mut self) -> ResourceResult<Vec<u8>> {
        let length = self.length().await?;
        let mut buffer = resource::allocate(length)?;
        let file = self.file().await?;
        file.seek(SeekFrom::Start(0)).await?;
        file.read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}

#[async_trait]
impl Resource for FileResource {
    fn source(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn file_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        Ok(MediaType::from_path(&self.source))
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        Ok(self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()))
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        if let Some(length) = self.length {
            return Ok(length);
        }
        let length = self.file().await?.metadata().await?.len();
        self.length = Some(length);
        Ok(length)
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        match range {
            Some(range) => self.read_range(range).await,
            None => self.read_all().await,
        }
    }

    async fn close(&mut self) {
        self.file = None;
    }
}
