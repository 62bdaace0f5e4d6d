//! Randomized prefetch queue over a [`Catalog`].
//!
//! Large catalogs are sampled in windows: the first fill starts at a random
//! offset, each refill continues where the last one stopped, and the cursor
//! wraps to the start once the catalog end is reached. Each window is
//! shuffled before it is served.

use super::{Catalog, ImageRef, SourceError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io::Read;
use tracing::debug;

pub struct QueuedSource<C> {
    catalog: C,
    queue: VecDeque<ImageRef>,
    capacity: usize,
    next_position: Option<usize>,
    rng: StdRng,
}

impl<C: Catalog> QueuedSource<C> {
    pub fn new(catalog: C, capacity: usize, seed: u64) -> Self {
        Self {
            catalog,
            queue: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_position: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Issue one query and top the queue up to capacity.
    ///
    /// Returns the queue length afterwards.
    pub fn fill_queue(&mut self) -> Result<usize, SourceError> {
        let candidates = self.catalog.query()?;
        let count = candidates.len();

        if self.next_position.is_none() && count > self.capacity {
            self.next_position = Some(self.rng.gen_range(0..count - self.capacity));
        }
        let mut position = self.next_position.unwrap_or(0);
        if position >= count {
            // Catalog shrank since the last fill.
            position = 0;
        }

        let wanted = self.capacity.saturating_sub(self.queue.len());
        let mut batch: Vec<ImageRef> = candidates
            .into_iter()
            .skip(position)
            .take(wanted)
            .collect();
        position += batch.len();
        self.next_position = Some(if position >= count { 0 } else { position });

        batch.shuffle(&mut self.rng);
        self.queue.extend(batch);
        debug!(
            provider = self.catalog.kind().prefix(),
            queued = self.queue.len(),
            catalog = count,
            "filled queue"
        );
        Ok(self.queue.len())
    }

    /// Next candidate, refilling (one query) when the queue is empty.
    pub fn next_ref(&mut self) -> Result<Option<ImageRef>, SourceError> {
        if self.queue.is_empty() {
            self.fill_queue()?;
        }
        Ok(self.queue.pop_front())
    }

    pub fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>, SourceError> {
        self.catalog.open(image)
    }
}
