//! EPUB positions: the ordered list of [`Locator`]s splitting a publication
//! into stable, addressable positions.
//!
//! - Fixed-layout resources have exactly one position.
//! - Reflowable resources are split into pages of a fixed number of bytes,
//!   according to a [`ReflowableStrategy`].
//!
//! Positions are computed from the reading order metadata and the lengths reported
//! by the publication [`Container`](crate::container::Container); resource content
//! is never read.

mod locator;
mod service;

pub use self::{
    locator::{Locations, Locator},
    service::EpubPositionsService,
};

use crate::media_type::MediaType;
use crate::resource::Properties;
use crate::util::{self, str::StrExt};
use std::fmt::{Display, Formatter};

/// The layout of a publication or of a single reading order resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One fixed-size page per resource (`fixed`, also known as `pre-paginated`).
    Fixed,
    /// Content reflowing to fit the viewport (`reflowable`).
    Reflowable,
}

impl Layout {
    /// Parses a declared layout value, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// # use lectern::positions::Layout;
    /// assert_eq!(Some(Layout::Fixed), Layout::parse("pre-paginated"));
    /// assert_eq!(Some(Layout::Reflowable), Layout::parse(" Reflowable "));
    /// assert_eq!(None, Layout::parse("scrolled"));
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if value.eq_ignore_ascii_case("fixed") || value.eq_ignore_ascii_case("pre-paginated") {
            Some(Self::Fixed)
        } else if value.eq_ignore_ascii_case("reflowable") {
            Some(Self::Reflowable)
        } else {
            None
        }
    }

    /// The declared value of this layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Reflowable => "reflowable",
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reading order item of a publication, as declared by its manifest.
///
/// # Properties
/// - `layout`: the [`Layout`] of this resource, overriding the publication layout.
/// - `encrypted` → `originalLength`: the plaintext length of an encrypted resource.
///
/// # Examples
/// ```
/// # use lectern::MediaType;
/// # use lectern::positions::{Layout, Link};
/// # use lectern::resource::Properties;
/// let link = Link::new("OEBPS/c1.xhtml#intro")
///     .with_media_type(MediaType::XHTML)
///     .with_title("Chapter 1")
///     .with_properties(Properties::new().with("layout", "fixed"));
///
/// assert_eq!(Some(Layout::Fixed), link.layout());
/// assert_eq!(None, link.original_length());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    href: String,
    media_type: Option<MediaType>,
    title: Option<String>,
    properties: Properties,
}

impl Link {
    /// Creates a link to `href`, relative to the root of the publication container.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: None,
            title: None,
            properties: Properties::new(),
        }
    }

    /// Sets the declared media type.
    pub fn with_media_type(mut self, media_type: impl Into<MediaType>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the properties, replacing existing ones.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// The href, as declared.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// The declared media type, if any.
    pub fn media_type(&self) -> Option<&MediaType> {
        self.media_type.as_ref()
    }

    /// The title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Additional properties, such as `layout` or `encrypted`.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The layout declared for this resource, if any and recognized.
    pub fn layout(&self) -> Option<Layout> {
        self.properties.layout().and_then(Layout::parse)
    }

    /// The plaintext length of this resource when it is encrypted.
    pub fn original_length(&self) -> Option<u64> {
        self.properties.original_length()
    }

    /// The path of the linked resource within the publication container.
    ///
    /// `OEBPS/c%201.xhtml#intro` → `/OEBPS/c 1.xhtml`
    pub(crate) fn container_path(&self) -> String {
        util::uri::decode(util::uri::strip_fragment(&self.href)).rooted()
    }
}

/// Strategy calculating the number of positions of a reflowable resource.
///
/// A fixed-layout resource always has a single position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReflowableStrategy {
    /// Splits the original length of each resource (before compression and encryption)
    /// into pages of `page_length` bytes.
    ///
    /// The original length is declared through the `encrypted` → `originalLength`
    /// link property, otherwise the length reported by the container is used.
    OriginalLength {
        /// Bytes per position.
        page_length: u64,
    },
    /// Splits the archive entry length of each resource (whether compressed or stored)
    /// into pages of `page_length` bytes.
    ///
    /// Resources without [`ArchiveProperties`](crate::resource::ArchiveProperties)
    /// use the length reported by the container.
    ArchiveEntryLength {
        /// Bytes per position.
        page_length: u64,
    },
}

impl ReflowableStrategy {
    /// Original length split into pages of 1024 bytes.
    pub const RECOMMENDED: Self = Self::OriginalLength { page_length: 1024 };

    /// Creates an [`ReflowableStrategy::OriginalLength`] strategy.
    ///
    /// # Panics
    /// If `page_length` is zero.
    pub fn original_length(page_length: u64) -> Self {
        assert!(page_length > 0, "page length must be greater than zero");
        Self::OriginalLength { page_length }
    }

    /// Creates an [`ReflowableStrategy::ArchiveEntryLength`] strategy.
    ///
    /// # Panics
    /// If `page_length` is zero.
    pub fn archive_entry_length(page_length: u64) -> Self {
        assert!(page_length > 0, "page length must be greater than zero");
        Self::ArchiveEntryLength { page_length }
    }

    /// The number of bytes per position.
    pub fn page_length(&self) -> u64 {
        match self {
            Self::OriginalLength { page_length } | Self::ArchiveEntryLength { page_length } => {
                *page_length
            }
        }
    }

    /// The maximum number of positions of a single resource.
    ///
    /// Lengths are declared by the publication (archive headers, `originalLength`)
    /// and may be forged; a resource exceeding this count is unlikely to be genuine.
    pub const MAX_POSITION_COUNT: u64 = 1 << 20;

    /// The number of positions of a reflowable resource of `length` bytes,
    /// or [`None`] if it exceeds [`Self::MAX_POSITION_COUNT`].
    ///
    /// Empty resources still have one position.
    pub fn position_count(&self, length: u64) -> Option<usize> {
        let count = length.div_ceil(self.page_length()).max(1);
        if count > Self::MAX_POSITION_COUNT {
            return None;
        }
        usize::try_from(count).ok()
    }
}

impl Default for ReflowableStrategy {
    fn default() -> Self {
        Self::RECOMMENDED
    }
}

/// Settings used by [`EpubPositionsService`].
///
/// To create a mutable settings instance, see
/// [`PositionsSettings::builder`] or [`PositionsSettings::default`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct PositionsSettings {
    /// How reflowable resources are split into positions.
    ///
    /// Default: [`ReflowableStrategy::RECOMMENDED`]
    pub reflowable_strategy: ReflowableStrategy,
    /// The media type of locators whose reading order item declares none,
    /// as untyped reading order items are assumed to be content documents.
    ///
    /// Default: [`MediaType::HTML`]
    pub fallback_media_type: MediaType,
}

impl PositionsSettings {
    /// Returns a builder to create a [`PositionsSettings`] instance.
    pub fn builder() -> PositionsSettingsBuilder {
        PositionsSettingsBuilder(Self::default())
    }
}

impl Default for PositionsSettings {
    fn default() -> Self {
        Self {
            reflowable_strategy: ReflowableStrategy::RECOMMENDED,
            fallback_media_type: MediaType::HTML,
        }
    }
}

impl From<PositionsSettingsBuilder> for PositionsSettings {
    fn from(value: PositionsSettingsBuilder) -> Self {
        value.build()
    }
}

/// Builder to construct a [`PositionsSettings`] instance.
///
/// # Examples
/// - Splitting reflowable resources by their archive entry length:
/// ```
/// # use lectern::positions::{PositionsSettings, ReflowableStrategy};
/// let settings = PositionsSettings::builder()
///     .reflowable_strategy(ReflowableStrategy::archive_entry_length(1024))
///     .build();
///
/// assert_eq!(1024, settings.reflowable_strategy.page_length());
/// ```
#[derive(Clone, Debug)]
pub struct PositionsSettingsBuilder(PositionsSettings);

impl PositionsSettingsBuilder {
    /// Turn this builder into a [`PositionsSettings`] instance.
    pub fn build(self) -> PositionsSettings {
        self.0
    }

    /// See [`PositionsSettings::reflowable_strategy`].
    pub fn reflowable_strategy(mut self, strategy: ReflowableStrategy) -> Self {
        self.0.reflowable_strategy = strategy;
        self
    }

    /// See [`PositionsSettings::fallback_media_type`].
    pub fn fallback_media_type(mut self, media_type: MediaType) -> Self {
        self.0.fallback_media_type = media_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Link, ReflowableStrategy};
    use crate::resource::Properties;

    #[test]
    fn test_position_count() {
        let strategy = ReflowableStrategy::original_length(50);

        #[rustfmt::skip]
        let expected = [
            (Some(1), 0),
            (Some(1), 1),
            (Some(1), 49),
            (Some(1), 50),
            (Some(2), 51),
            (Some(3), 120),
            (Some(3), 150),
            (Some(1 << 20), 50 << 20),
            (None, (50 << 20) + 1),
            (None, u64::MAX),
        ];

        for (expect, length) in expected {
            assert_eq!(expect, strategy.position_count(length), "{length}");
        }
    }

    #[test]
    #[should_panic(expected = "page length must be greater than zero")]
    fn test_zero_page_length() {
        ReflowableStrategy::archive_entry_length(0);
    }

    #[test]
    fn test_container_path() {
        #[rustfmt::skip]
        let expected = [
            ("/OEBPS/c1.xhtml", "OEBPS/c1.xhtml"),
            ("/OEBPS/c 1.xhtml", "/OEBPS/c%201.xhtml#intro"),
            ("/chap1", "chap1?query"),
        ];

        for (expect, href) in expected {
            assert_eq!(expect, Link::new(href).container_path(), "{href}");
        }
    }

    #[test]
    fn test_link_metadata() {
        let link = Link::new("chap1").with_properties(
            Properties::new().with("layout", "unknown").with(
                "encrypted",
                Properties::new().with("originalLength", 20),
            ),
        );

        assert_eq!(None, link.layout());
        assert_eq!(Some(20), link.original_length());
    }
}
