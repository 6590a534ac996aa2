use crate::media_type::MediaType;

/// A precise location in a publication, such as one of its positions.
///
/// # Examples
/// ```
/// # use lectern::MediaType;
/// # use lectern::positions::{Locations, Locator};
/// let locator = Locator::new("OEBPS/c1.xhtml", MediaType::XHTML)
///     .with_title("Chapter 1")
///     .with_locations(Locations {
///         progression: Some(0.5),
///         position: Some(12),
///         ..Locations::default()
///     });
///
/// assert_eq!(Some(12), locator.locations.position);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Locator {
    /// The href of the resource, as declared by the reading order.
    pub href: String,
    /// The media type of the resource.
    pub media_type: MediaType,
    /// The title of the resource, if any.
    pub title: Option<String>,
    /// Where the locator points to within the resource and the publication.
    pub locations: Locations,
}

impl Locator {
    /// Creates a locator at the beginning of the resource at `href`.
    pub fn new(href: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            href: href.into(),
            media_type,
            title: None,
            locations: Locations::default(),
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the locations.
    pub fn with_locations(mut self, locations: Locations) -> Self {
        self.locations = locations;
        self
    }
}

/// The location of a [`Locator`], expressed in complementary ways.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Locations {
    /// Fragment identifiers within the resource (e.g., `intro`, `t=10`).
    pub fragments: Vec<String>,
    /// Progression within the resource, in `[0, 1)`.
    pub progression: Option<f64>,
    /// 1-based index of the position within the publication.
    pub position: Option<usize>,
    /// Progression within the publication, in `[0, 1)`.
    pub total_progression: Option<f64>,
}
