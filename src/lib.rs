//! # lectern
//! Format-agnostic resource and archive access for digital publications,
//! with an EPUB positions engine.
//!
//! # Overview
//! - [`resource`]: The [`Resource`](resource::Resource) abstraction over a byte sequence
//!   (files, archive entries, memory) and composable decorators
//!   (buffering, transforming, fallback, lazy).
//! - [`container`]: Collections of resources addressed by path, such as ZIP archives
//!   and directories, plus routing and transforming containers.
//! - [`factory`]: Opening resources and containers from URLs, with fallback chains.
//! - [`positions`]: Splitting an EPUB reading order into addressable
//!   [`Locator`](positions::Locator) positions.
//! - [`MediaType`]: MIME type of a resource.
//!
//! Every I/O bearing operation is asynchronous and runs on [tokio](https://tokio.rs).
//!
//! # Examples
//! - Reading an entry of an EPUB file:
//! ```no_run
//! # use lectern::container::{Container, ZipContainer};
//! # use lectern::resource::Resource;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = ZipContainer::open("book.epub").await?;
//! let mut chapter = container.get("/OEBPS/c1.xhtml");
//!
//! // Ranged reads are clamped to the length of the entry
//! let head = chapter.read(Some(0..1024)).await?;
//! let xhtml = chapter.read_to_string().await?;
//!
//! container.close().await;
//! # Ok(())
//! # }
//! ```
//! - Computing the positions of a publication:
//! ```no_run
//! # use lectern::container::DirectoryContainer;
//! # use lectern::positions::{EpubPositionsService, Link, PositionsSettings};
//! # use std::sync::Arc;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = DirectoryContainer::open("extracted_book").await?;
//! let service = EpubPositionsService::new(
//!     [Link::new("OEBPS/c1.xhtml"), Link::new("OEBPS/c2.xhtml")],
//!     None,
//!     Arc::new(container),
//!     PositionsSettings::default(),
//! );
//!
//! let positions = service.positions().await;
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod factory;
mod media_type;
pub mod positions;
pub mod resource;
mod util;

pub use self::media_type::MediaType;

/// The prelude contains the traits required to use containers, resources, and factories.
#[cfg(feature = "prelude")]
pub mod prelude {
    pub use crate::container::Container;
    pub use crate::factory::{ArchiveFactory, ContainerFactory, ResourceFactory};
    pub use crate::resource::{Resource, ResourceExt};
}
