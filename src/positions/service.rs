use crate::container::Container;
use crate::media_type::MediaType;
use crate::positions::{Layout, Link, Locations, Locator, PositionsSettings, ReflowableStrategy};
use crate::resource::Resource;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Computes the positions of an EPUB publication from its reading order and container.
///
/// The effective layout of each resource is its own `layout` property, else the
/// publication layout, else [`Layout::Reflowable`].
/// Positions are computed once on first access and memoized.
///
/// Lengths which cannot be retrieved from the container count as zero,
/// so an unreadable resource still has exactly one position rather than failing
/// the whole computation.
///
/// # Examples
/// ```no_run
/// # use lectern::container::ZipContainer;
/// # use lectern::positions::{EpubPositionsService, Layout, Link, PositionsSettings};
/// # use std::sync::Arc;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let container = ZipContainer::open("book.epub").await?;
/// let reading_order = [Link::new("OEBPS/c1.xhtml"), Link::new("OEBPS/c2.xhtml")];
/// let service = EpubPositionsService::new(
///     reading_order,
///     Some(Layout::Reflowable),
///     Arc::new(container),
///     PositionsSettings::default(),
/// );
///
/// for locator in service.positions().await {
///     println!("{}: {:?}", locator.href, locator.locations.position);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EpubPositionsService {
    reading_order: Vec<Link>,
    layout: Option<Layout>,
    container: Arc<dyn Container>,
    settings: PositionsSettings,
    positions: OnceCell<Vec<Vec<Locator>>>,
}

impl EpubPositionsService {
    /// Creates a service for the given `reading_order`, with `layout`
    /// being the layout declared for the whole publication, if any.
    pub fn new(
        reading_order: impl IntoIterator<Item = Link>,
        layout: Option<Layout>,
        container: Arc<dyn Container>,
        settings: impl Into<PositionsSettings>,
    ) -> Self {
        Self {
            reading_order: reading_order.into_iter().collect(),
            layout,
            container,
            settings: settings.into(),
            positions: OnceCell::new(),
        }
    }

    /// The reading order the positions are computed from.
    pub fn reading_order(&self) -> &[Link] {
        &self.reading_order
    }

    /// The positions grouped per reading order item, in reading order.
    pub async fn positions_by_reading_order(&self) -> &[Vec<Locator>] {
        self.positions
            .get_or_init(|| async {
                let items = self.gather().await;
                let positions = compute(&items, &self.settings);
                tracing::debug!(
                    items = items.len(),
                    positions = positions.iter().map(Vec::len).sum::<usize>(),
                    "computed epub positions"
                );
                positions
            })
            .await
    }

    /// All positions of the publication, in reading order.
    pub async fn positions(&self) -> Vec<Locator> {
        self.positions_by_reading_order()
            .await
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Resolves the layout and length of every reading order item.
    async fn gather(&self) -> Vec<ReadingOrderItem> {
        let mut items = Vec::with_capacity(self.reading_order.len());

        for link in &self.reading_order {
            let layout = link.layout().or(self.layout).unwrap_or(Layout::Reflowable);
            let length = match layout {
                // Fixed-layout resources have a single position whatever their length
                Layout::Fixed => 0,
                Layout::Reflowable => self.reflowable_length(link).await,
            };

            items.push(ReadingOrderItem {
                href: link.href().to_owned(),
                media_type: link.media_type().cloned(),
                title: link.title().map(str::to_owned),
                layout,
                length,
            });
        }
        items
    }

    async fn reflowable_length(&self, link: &Link) -> u64 {
        let strategy = self.settings.reflowable_strategy;
        if let ReflowableStrategy::OriginalLength { .. } = strategy
            && let Some(length) = link.original_length()
        {
            return length;
        }

        let mut entry = self.container.get(&link.container_path());
        let archive_length = match strategy {
            ReflowableStrategy::ArchiveEntryLength { .. } => entry
                .properties()
                .await
                .ok()
                .and_then(|properties| properties.archive())
                .map(|archive| archive.entry_length),
            ReflowableStrategy::OriginalLength { .. } => None,
        };
        let length = match archive_length {
            Some(length) => length,
            None => entry.length().await.unwrap_or_else(|error| {
                tracing::warn!(href = link.href(), %error, "unable to retrieve resource length");
                0
            }),
        };

        entry.close().await;
        length
    }
}

impl Debug for EpubPositionsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpubPositionsService")
            .field("reading_order", &self.reading_order)
            .field("layout", &self.layout)
            .field("settings", &self.settings)
            .field("positions", &self.positions.get().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// A reading order item with its effective layout and length resolved.
#[derive(Clone, Debug)]
pub(crate) struct ReadingOrderItem {
    pub(crate) href: String,
    pub(crate) media_type: Option<MediaType>,
    pub(crate) title: Option<String>,
    pub(crate) layout: Layout,
    /// The length used to split a reflowable resource, in bytes.
    pub(crate) length: u64,
}

/// Splits every item into positions, numbered sequentially from 1.
pub(crate) fn compute(
    items: &[ReadingOrderItem],
    settings: &PositionsSettings,
) -> Vec<Vec<Locator>> {
    let mut last_position = 0;
    let mut positions = items
        .iter()
        .map(|item| {
            let count = match item.layout {
                Layout::Fixed => 1,
                Layout::Reflowable => settings
                    .reflowable_strategy
                    .position_count(item.length)
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            href = %item.href,
                            length = item.length,
                            "resource length exceeds the position limit; using a single position"
                        );
                        1
                    }),
            };
            let media_type = item
                .media_type
                .clone()
                .unwrap_or_else(|| settings.fallback_media_type.clone());

            let locators = (0..count)
                .map(|index| Locator {
                    href: item.href.clone(),
                    media_type: media_type.clone(),
                    title: item.title.clone(),
                    locations: Locations {
                        progression: Some(index as f64 / count as f64),
                        position: Some(last_position + index + 1),
                        ..Locations::default()
                    },
                })
                .collect::<Vec<_>>();

            last_position += count;
            locators
        })
        .collect::<Vec<_>>();

    let total = last_position as f64;
    for locator in positions.iter_mut().flatten() {
        if let Some(position) = locator.locations.position {
            locator.locations.total_progression = Some((position - 1) as f64 / total);
        }
    }
    positions
}
