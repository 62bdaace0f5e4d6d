//! The photo supplier façade.

use super::queue::QueuedSource;
use super::{AlbumData, Catalog, ImageRef, ImageSupplier, LoadError, SourceError};
use crate::imaging::{DecodeParams, DecodedImage, ImageDecoder};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

type Slot = Mutex<QueuedSource<Box<dyn Catalog>>>;

/// Multiplexes the remote, local and stock providers behind one `next()`.
///
/// Remote and local are served together: each call starts with the one the
/// previous call did not start with, and falls back to the other. Stock is
/// only consulted when both yield nothing. Every provider is asked at most
/// once per call. Each provider has its own lock, so concurrent callers
/// serialize per provider, not globally.
pub struct SourcePlexor {
    remote: Option<Slot>,
    local: Option<Slot>,
    stock: Option<Slot>,
    decoder: Box<dyn ImageDecoder>,
    turn: AtomicUsize,
}

fn lock(slot: &Slot) -> MutexGuard<'_, QueuedSource<Box<dyn Catalog>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SourcePlexor {
    pub fn new(decoder: impl ImageDecoder + 'static) -> Self {
        Self {
            remote: None,
            local: None,
            stock: None,
            decoder: Box::new(decoder),
            turn: AtomicUsize::new(0),
        }
    }

    /// Fill the remote-album slot.
    pub fn with_remote(mut self, source: QueuedSource<Box<dyn Catalog>>) -> Self {
        self.remote = Some(Mutex::new(source));
        self
    }

    pub fn with_local(mut self, source: QueuedSource<Box<dyn Catalog>>) -> Self {
        self.local = Some(Mutex::new(source));
        self
    }

    pub fn with_stock(mut self, source: QueuedSource<Box<dyn Catalog>>) -> Self {
        self.stock = Some(Mutex::new(source));
        self
    }

    fn slots(&self) -> impl Iterator<Item = &Slot> {
        [&self.remote, &self.local, &self.stock]
            .into_iter()
            .flatten()
    }

    /// Albums from every configured provider: remote, local, then stock.
    pub fn albums(&self) -> Result<Vec<AlbumData>, SourceError> {
        let mut albums = Vec::new();
        for slot in self.slots() {
            albums.extend(lock(slot).catalog().list_albums()?);
        }
        Ok(albums)
    }

    /// Take one candidate from `slot` and open it under the slot's lock.
    fn take(slot: &Slot) -> Option<Result<(ImageRef, Box<dyn Read + Send>), SourceError>> {
        let mut source = lock(slot);
        let provider = source.catalog().kind().prefix();
        match source.next_ref() {
            Ok(Some(image)) => {
                debug!(provider, id = %image.id, "picked candidate");
                Some(source.open(&image).map(|stream| (image, stream)))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(provider, error = %e, "provider query failed");
                None
            }
        }
    }

    /// Remote and local in this call's turn order, then stock.
    fn order(&self) -> impl Iterator<Item = &Slot> {
        let mut shared = [&self.remote, &self.local];
        if self.turn.fetch_add(1, Ordering::Relaxed) % 2 == 1 {
            shared.reverse();
        }
        shared.into_iter().chain([&self.stock]).flatten()
    }

    fn pick(&self) -> Result<(ImageRef, Box<dyn Read + Send>), LoadError> {
        for slot in self.order() {
            if let Some(found) = Self::take(slot) {
                return Ok(found?);
            }
        }
        Err(LoadError::SupplyExhausted)
    }
}

impl ImageSupplier for SourcePlexor {
    fn next(&self, target_long_side: u32, target_short_side: u32) -> Result<DecodedImage, LoadError> {
        let (image, mut stream) = self.pick()?;
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(SourceError::from)?;
        let params = DecodeParams::new(target_long_side, target_short_side)
            .with_orientation(image.orientation);
        let decoded = self.decoder.decode(&bytes, &params)?;
        debug!(
            id = %image.id,
            width = decoded.width(),
            height = decoded.height(),
            "decoded"
        );
        Ok(decoded)
    }
}
