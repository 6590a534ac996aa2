use crate::container::{ArchiveError, ArchiveResult, Container, Entry};
use crate::media_type::MediaType;
use crate::resource::{
    self, ArchiveProperties, ByteRange, Properties, Resource, ResourceError, ResourceResult,
};
use crate::util::{self, str::StrExt};
use async_trait::async_trait;
use flate2::read::DeflateDecoder;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive};

trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Where the archive bytes live.
///
/// Every stream opens its own reader, so entries never share a file cursor.
#[derive(Clone)]
enum ArchiveSource {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

impl ArchiveSource {
    fn open(&self) -> io::Result<Box<dyn ReadSeek>> {
        Ok(match self {
            Self::File(path) => Box::new(BufReader::new(File::open(path)?)),
            Self::Memory(bytes) => Box::new(Cursor::new(Arc::clone(bytes))),
        })
    }

    fn path(&self) -> Option<PathBuf> {
        match self {
            Self::File(path) => Some(path.clone()),
            Self::Memory(_) => None,
        }
    }
}

/// Location and encoding of an entry within the archive.
#[derive(Copy, Clone, Debug)]
struct IndexEntry {
    index: usize,
    compression: CompressionMethod,
    compressed_size: u64,
    size: u64,
    data_start: u64,
    encrypted: bool,
}

struct Archive {
    source: ArchiveSource,
    name: Option<String>,
    index: BTreeMap<String, IndexEntry>,
    closed: AtomicBool,
}

impl Archive {
    fn read_index(source: &ArchiveSource) -> ArchiveResult<BTreeMap<String, IndexEntry>> {
        let reader = source
            .open()
            .map_err(|error| ArchiveError::unreadable(error, source.path()))?;
        let mut zip =
            ZipArchive::new(reader).map_err(|error| ArchiveError::from_zip(error, source.path()))?;
        let mut index = BTreeMap::new();

        for i in 0..zip.len() {
            // Raw access reads the metadata without requiring a password or decompressing
            let file = zip
                .by_index_raw(i)
                .map_err(|error| ArchiveError::from_zip(error, source.path()))?;

            if file.is_dir() {
                continue;
            }
            index.insert(
                file.name().rooted(),
                IndexEntry {
                    index: i,
                    compression: file.compression(),
                    compressed_size: file.compressed_size(),
                    size: file.size(),
                    data_start: file.data_start(),
                    encrypted: file.encrypted(),
                },
            );
        }
        Ok(index)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Classifies a failure of the zip crate while reading an entry.
///
/// Only I/O faults are transient; unsupported compression methods and corrupt
/// entries are not.
fn from_zip(error: ZipError) -> ResourceError {
    match error {
        ZipError::Io(error) => ResourceError::from_io(error),
        error => ResourceError::wrap(error),
    }
}

/// A decompressing stream over a single entry, starting at byte 0.
struct EntryStream {
    reader: Box<dyn Read + Send>,
    position: u64,
}

impl EntryStream {
    fn open(archive: &Archive, entry: &IndexEntry) -> ResourceResult<Self> {
        let raw = |archive: &Archive| -> io::Result<_> {
            let mut reader = archive.source.open()?;
            reader.seek(SeekFrom::Start(entry.data_start))?;
            Ok(reader.take(entry.compressed_size))
        };

        let reader: Box<dyn Read + Send> = match entry.compression {
            CompressionMethod::Stored => Box::new(raw(archive)?),
            CompressionMethod::Deflated => {
                Box::new(DeflateDecoder::new(raw(archive)?).take(entry.size))
            }
            // No streaming decoder; the zip crate inflates the whole entry
            _ => {
                let mut zip = ZipArchive::new(archive.source.open()?).map_err(from_zip)?;
                let mut file = zip.by_index(entry.index).map_err(from_zip)?;
                let mut data = resource::allocate(entry.size)?;
                file.read_to_end(&mut data)?;
                Box::new(Cursor::new(data))
            }
        };
        Ok(Self {
            reader,
            position: 0,
        })
    }

    fn skip_to(&mut self, position: u64) -> io::Result<()> {
        let skipped = io::copy(
            &mut (&mut self.reader).take(position - self.position),
            &mut io::sink(),
        )?;
        self.position += skipped;
        Ok(())
    }

    fn read_exact_or_eof(&mut self, length: u64) -> ResourceResult<Vec<u8>> {
        let mut buffer = resource::allocate(length)?;
        (&mut self.reader).take(length).read_to_end(&mut buffer)?;
        self.position += buffer.len() as u64;
        Ok(buffer)
    }
}

/// A [`Container`] providing access to the entries of a ZIP archive, such as an EPUB file.
///
/// Directory entries are omitted. Each [`ZipEntry`] owns a private decompression
/// stream so that forward sequential range reads continue where the previous read
/// stopped instead of inflating the entry from byte 0 every time.
///
/// # Examples
/// ```no_run
/// # use lectern::container::{Container, ZipContainer};
/// # use lectern::resource::Resource;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let container = ZipContainer::open("book.epub").await?;
/// let mut mimetype = container.get("/mimetype");
///
/// assert_eq!("application/epub+zip", mimetype.read_to_string().await?);
/// container.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ZipContainer {
    archive: Arc<Archive>,
}

impl ZipContainer {
    /// Opens the ZIP archive at `path` and reads its central directory.
    pub async fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        Self::from_source(ArchiveSource::File(path.to_path_buf()), Some(name)).await
    }

    /// Reads a ZIP archive held in memory.
    pub async fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> ArchiveResult<Self> {
        Self::from_source(ArchiveSource::Memory(bytes.into()), None).await
    }

    async fn from_source(source: ArchiveSource, name: Option<String>) -> ArchiveResult<Self> {
        let index = {
            let source = source.clone();
            tokio::task::spawn_blocking(move || Archive::read_index(&source))
                .await
                .map_err(|error| ArchiveError::unreadable(io::Error::other(error), None))??
        };

        tracing::debug!(source = ?name, entries = index.len(), "opened zip container");
        Ok(Self {
            archive: Arc::new(Archive {
                source,
                name,
                index,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Returns the entry at `path` with its ZIP specific accessors,
    /// or [`None`] if the archive has no such entry.
    ///
    /// `.` and `..` segments are resolved; a path escaping the archive root has no entry.
    pub fn entry(&self, path: &str) -> Option<ZipEntry> {
        let path = normalize(path)?;
        let entry = *self.archive.index.get(&path)?;

        Some(ZipEntry {
            archive: Arc::clone(&self.archive),
            path,
            entry,
            stream: None,
        })
    }
}

impl Debug for ZipContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipContainer")
            .field("source", &self.archive.name)
            .field("entries", &self.archive.index.len())
            .field("closed", &self.archive.is_closed())
            .finish()
    }
}

#[async_trait]
impl Container for ZipContainer {
    fn source(&self) -> Option<&str> {
        self.archive.name.as_deref()
    }

    async fn entries(&self) -> Option<BTreeSet<String>> {
        Some(self.archive.index.keys().cloned().collect())
    }

    fn get(&self, path: &str) -> Entry {
        if normalize(path).is_none() {
            tracing::warn!(path, "rejected path escaping the zip container");
            return Entry::failure(
                path,
                ResourceError::forbidden(format!("`{path}` is outside of the archive")),
            );
        }

        match self.entry(path) {
            Some(entry) => Entry::new(path, entry),
            None => Entry::failure(
                path,
                ResourceError::not_found(format!("`{path}` is not in the archive")),
            ),
        }
    }

    async fn close(&self) {
        if !self.archive.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(source = ?self.archive.name, "closed zip container");
        }
    }
}

/// Resolves `path` into the rooted key of the archive index.
fn normalize(path: &str) -> Option<String> {
    util::uri::normalize(path).map(|segments| segments.join("/").rooted())
}

/// A [`Resource`] reading a single entry of a [`ZipContainer`].
///
/// # Range reads
/// A ranged read continues the retained decompression stream when the range starts
/// at or after the stream position. Otherwise, the stream is restarted from byte 0,
/// which is correct though costly for compressed entries; backward access is best
/// served through a [`BufferingResource`](crate::resource::BufferingResource) or a
/// full read.
pub struct ZipEntry {
    archive: Arc<Archive>,
    path: String,
    entry: IndexEntry,
    stream: Option<EntryStream>,
}

impl ZipEntry {
    /// The path of this entry within the archive, rooted at `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The length of the entry as stored in the archive,
    /// only if the entry is compressed (i.e., not `STORED`).
    pub fn compressed_length(&self) -> Option<u64> {
        (self.entry.compression != CompressionMethod::Stored).then_some(self.entry.compressed_size)
    }

    fn check_access(&mut self) -> ResourceResult<()> {
        if self.archive.is_closed() {
            self.stream = None;
            return Err(ResourceError::unavailable(format!(
                "`{}` belongs to a closed archive",
                self.path
            )));
        }
        if self.entry.encrypted {
            return Err(ResourceError::forbidden(format!(
                "`{}` is encrypted",
                self.path
            )));
        }
        Ok(())
    }

    async fn read_all(&mut self) -> ResourceResult<Vec<u8>> {
        let archive = Arc::clone(&self.archive);
        let entry = self.entry;

        tokio::task::spawn_blocking(move || {
            let mut stream = EntryStream::open(&archive, &entry)?;
            stream.read_exact_or_eof(entry.size)
        })
        .await
        .map_err(ResourceError::wrap)?
    }

    async fn read_range(&mut self, range: ByteRange) -> ResourceResult<Vec<u8>> {
        let range = resource::clamp(&range, self.entry.size);
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let archive = Arc::clone(&self.archive);
        let entry = self.entry;
        let retained = self.stream.take();
        let path = self.path.clone();

        let (stream, data) = tokio::task::spawn_blocking(move || {
            let mut stream = match retained {
                Some(stream) if stream.position <= range.start => stream,
                retained => {
                    if let Some(stream) = retained {
                        tracing::debug!(
                            path = %path,
                            position = stream.position,
                            start = range.start,
                            "restarting zip entry stream for a backward read"
                        );
                    }
                    EntryStream::open(&archive, &entry)?
                }
            };
            stream.skip_to(range.start)?;
            let data = stream.read_exact_or_eof(range.end - range.start)?;
            ResourceResult::Ok((stream, data))
        })
        .await
        .map_err(ResourceError::wrap)??;

        self.stream = Some(stream);
        Ok(data)
    }
}

impl Debug for ZipEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipEntry")
            .field("path", &self.path)
            .field("entry", &self.entry)
            .field("position", &self.stream.as_ref().map(|stream| stream.position))
            .finish()
    }
}

#[async_trait]
impl Resource for ZipEntry {
    async fn media_type(&mut self) -> ResourceResult<Option<MediaType>> {
        Ok(MediaType::from_path(&self.path))
    }

    async fn name(&mut self) -> ResourceResult<Option<String>> {
        Ok(self.path.rsplit('/').next().map(str::to_owned))
    }

    async fn properties(&mut self) -> ResourceResult<Properties> {
        let mut properties = Properties::new();
        properties.set_archive(ArchiveProperties {
            entry_length: self.entry.compressed_size,
            is_entry_compressed: self.entry.compression != CompressionMethod::Stored,
        });
        Ok(properties)
    }

    async fn length(&mut self) -> ResourceResult<u64> {
        self.check_access()?;
        Ok(self.entry.size)
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        self.check_access()?;

        match range {
            Some(range) => self.read_range(range).await,
            None => self.read_all().await,
        }
    }

    async fn close(&mut self) {
        self.stream = None;
    }
}
