use crate::media_type::MediaType;
use crate::resource::{self, ByteRange, Properties, Resource, ResourceResult};
use async_trait::async_trait;

/// Wraps a [`Resource`] and buffers its content.
///
/// Each physical read is rounded up to the next multiple of the chunk size, and the
/// tail chunk of that read is retained. Subsequent requests covered by the retained
/// chunk are served from memory; requests whose beginning is covered only read the
/// missing suffix. Forward sequential small reads (e.g., serving a resource by chunks)
/// therefore cost amortized O(1) physical reads.
///
/// The buffer is ignored when reading backward or far ahead, and reading without a
/// range bypasses buffering entirely.
///
/// # Examples
/// ```
/// # use lectern::resource::{BufferingResource, BytesResource, Resource, ResourceResult};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ResourceResult<()> {
/// let mut resource = BufferingResource::new(BytesResource::new("0123456789"))
///     .chunk_size(4);
///
/// assert_eq!(b"01", resource.read(Some(0..2)).await?.as_slice());
/// // Served from the retained chunk `0..4`
/// assert_eq!(b"23", resource.read(Some(2..4)).await?.as_slice());
/// # Ok(())
/// # }
/// ```
pub struct BufferingResource {
    inner: Box<dyn Resource>,
    length: Option<ResourceResult<u64>>,
    chunk_size: u64,
    /// Bytes retained from the last physical read, with the range they cover.
    buffer: Option<(Vec<u8>, ByteRange)>,
}

impl BufferingResource {
    /// Size of the chunks read from the wrapped resource by default.
    pub const DEFAULT_CHUNK_SIZE: u64 = 8192;

    /// Wraps `resource` with the default chunk size.
    pub fn new(resource: impl Resource + 'static) -> Self {
        Self {
            inner: Box::new(resource),
            length: None,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            buffer: None,
        }
    }

    /// Sets the size of the chunks to read from the wrapped resource.
    ///
    /// # Panics
    /// If `chunk_size` is `0`.
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be greater than zero");
        self.chunk_size = chunk_size;
        self
    }

    /// Provides the total length of the wrapped resource when it is known,
    /// avoiding a request to the wrapped resource.
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(Ok(length));
        self
    }

    async fn cached_length(&mut self) -> Option<u64> {
        if self.length.is_none() {
            self.length = Some(self.inner.length().await);
        }
        self.length.as_ref()?.as_ref().ok().copied()
    }

    /// Keeps the last chunk of `data`, which was read starting at `start`.
    fn save_buffer(&mut self, mut data: Vec<u8>, start: u64) {
        let end = start + data.len() as u64;
        let keep = data.len().min(usize::try_from(self.chunk_size).unwrap_or(usize::MAX));

        data.drain(..data.len() - keep);
        self.buffer = Some((data, end - keep as u64..end));
    }

    async fn read_buffered(&mut self, range: ByteRange, length: u64) -> ResourceResult<Vec<u8>> {
        let requested = resource::clamp(&range, length);
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        // Round up to the next chunk, as the excess is buffered
        let read_end = requested
            .end
            .div_ceil(self.chunk_size)
            .saturating_mul(self.chunk_size)
            .min(length);

        if let Some((mut data, buffered)) = self.buffer.take() {
            // Everything already buffered
            if buffered.start <= requested.start && requested.end <= buffered.end {
                let bytes = extract(&requested, &data, buffered.start);
                self.buffer = Some((data, buffered));
                return Ok(bytes);
            }

            // Beginning of the requested data is buffered
            if buffered.contains(&requested.start) {
                let missing = buffered.end..read_end;
                return match self.inner.read(Some(missing)).await {
                    Ok(read) => {
                        data.extend_from_slice(&read);
                        let bytes = extract(&requested, &data, buffered.start);
                        self.save_buffer(data, buffered.start);
                        Ok(bytes)
                    }
                    Err(error) => {
                        self.buffer = Some((data, buffered));
                        Err(error)
                    }
                };
            }
            self.buffer = Some((data, buffered));
        }

        let data = self.inner.read(Some(requested.start..read_end)).await?;
        let bytes = extract(&requested, &data, requested.start);
        self.save_buffer(data, requested.start);
        Ok(bytes)
    }
}

/// Extracts `requested` out of `data`, which starts at the absolute offset `start`.
fn extract(requested: &ByteRange, data: &[u8], start: u64) -> Vec<u8> {
    let first = usize::try_from(requested.start - start).unwrap_or(usize::MAX);
    let last = usize::try_from(requested.end - start).unwrap_or(usize::MAX);

    // The wrapped resource may return less than its declared length
    let last = last.min(data.len());
    data.get(first..last).map(<[u8]>::to_vec).unwrap_or_default()
}

#[async_trait]
impl Resource for BufferingResource {
    fn source(&self) -> Option<&str> {
        self.inner.source()
    }

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
        match &self.length {
            Some(length) => length.clone(),
            None => {
                let length = self.inner.length().await;
                self.length = Some(length.clone());
                length
            }
        }
    }

    async fn read(&mut self, range: Option<ByteRange>) -> ResourceResult<Vec<u8>> {
        let Some(range) = range else {
            // Reading the whole resource bypasses buffering
            return self.inner.read(None).await;
        };
        match self.cached_length().await {
            Some(length) => self.read_buffered(range, length).await,
            None => self.inner.read(Some(range)).await,
        }
    }

    async fn close(&mut self) {
        self.buffer = None;
        self.inner.close().await;
    }
}
