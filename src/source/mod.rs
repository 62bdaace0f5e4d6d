//! Photo providers and the façade that multiplexes them.
//!
//! A provider is a [`Catalog`]: one `query()` lists every candidate it can
//! currently offer, and `open()` streams the bytes of one candidate. The
//! [`QueuedSource`] wrapper turns a catalog into a randomized prefetch queue,
//! and the [`SourcePlexor`] serves remote and local in alternation:
//!
//! ```text
//! remote  ──┐    (take turns going first)
//! local   ──┼──▶ first candidate found ──▶ open ──▶ ImageDecoder ──▶ DecodedImage
//! stock   ──┘    (stock only when the others yield nothing)
//! ```
//!
//! The table never talks to providers directly; the runtime calls the
//! [`ImageSupplier`] trait from a worker thread.

mod local;
mod plexor;
mod queue;
mod settings;
mod stock;

pub use local::LocalCatalog;
pub use plexor::SourcePlexor;
pub use queue::QueuedSource;
pub use settings::{ALBUM_SET, AlbumSettings, SettingsError};
pub use stock::StockCatalog;

use crate::imaging::{DecodeError, DecodedImage, Orientation};
use serde::Serialize;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot open {id}: {reason}")]
    Open { id: String, reason: String },
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Image synthesis failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Why a supplier could not produce an image this round.
///
/// None of these are fatal. [`LoadError::is_retryable`] tells the table
/// whether to retry the same slot shortly or wait for the next drop tick.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No provider produced a candidate")]
    SupplyExhausted,
    #[error("Could not open image stream: {0}")]
    StreamOpen(#[from] SourceError),
    #[error("Could not decode image: {0}")]
    Decode(#[from] DecodeError),
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::SupplyExhausted)
    }
}

/// Which slot of the façade a provider fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Remote,
    Local,
    Stock,
}

impl ProviderKind {
    /// Prefix used for this provider's album ids (`local:Travel`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Stock => "stock",
        }
    }
}

/// A candidate image as reported by a provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Provider-specific identifier (a path, a stock index, a remote id).
    pub id: String,
    /// Provider-prefixed album id, when the provider groups images.
    pub album_id: Option<String>,
    /// Clockwise rotation of the stored pixels.
    pub orientation: Orientation,
}

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            album_id: None,
            orientation: Orientation::default(),
        }
    }
}

/// An album a provider can offer, for the settings surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumData {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    /// Seconds since the Unix epoch of the most recent change.
    pub updated: u64,
}

/// A photo provider.
///
/// `query` is expected to be one round trip to the backing store; the
/// prefetch queue calls it at most once per refill.
pub trait Catalog: Send {
    fn kind(&self) -> ProviderKind;

    /// Every candidate the provider currently offers, in a stable order.
    fn query(&mut self) -> Result<Vec<ImageRef>, SourceError>;

    /// Open a byte stream for one candidate. Blocking is acceptable.
    fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>, SourceError>;

    /// Albums for the settings surface. Not used by the table.
    fn list_albums(&self) -> Result<Vec<AlbumData>, SourceError> {
        Ok(Vec::new())
    }
}

impl<C: Catalog + ?Sized> Catalog for Box<C> {
    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    fn query(&mut self) -> Result<Vec<ImageRef>, SourceError> {
        (**self).query()
    }

    fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>, SourceError> {
        (**self).open(image)
    }

    fn list_albums(&self) -> Result<Vec<AlbumData>, SourceError> {
        (**self).list_albums()
    }
}

/// What the runtime calls from worker threads to get the next image.
pub trait ImageSupplier: Send + Sync {
    fn next(&self, target_long_side: u32, target_short_side: u32)
    -> Result<DecodedImage, LoadError>;
}
