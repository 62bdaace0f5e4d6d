//! The table manager.
//!
//! A [`Table`] owns every image currently on the display surface and drives
//! each one through its lifecycle:
//!
//! ```text
//! Loading ──▶ Placed ──▶ Selected ──▶ Dropping ──▶ Placed ──▶ FadingOut ──▶ removed
//!   (slot)       ▲  └────────── fling (stays on surface) ──┘          ▲
//!                └──────────────── capacity eviction ─────────────────┘
//! ```
//!
//! The table is a plain single-owner state machine. It never blocks, never
//! spawns, and never reads a clock: callers pass `now` (time since the table
//! epoch) into every operation. Work that has to happen elsewhere comes out
//! of two outboxes:
//!
//! - [`Table::take_requests`]: loads to run on a worker. Results go back in
//!   through [`Table::apply_completion`].
//! - [`Table::take_events`]: lifecycle notifications, including exactly one
//!   [`TableEvent::Released`] per bitmap.
//!
//! ## Eviction
//!
//! On-table items sit in a FIFO ordered by `order_key`. Touching an item moves
//! it to the back. Whenever a drop settles and the FIFO holds more than
//! `capacity` items, the oldest non-selected ones are moved to a separate
//! fading list until the FIFO is back within capacity.
//!
//! ## Loads
//!
//! Each load slot carries a [`LoadToken`]. Retryable failures re-request the
//! same slot under a new generation after the [`RetryPolicy`] delay, forever.
//! `SupplyExhausted` abandons the slot; the next drop-timer tick tries again.

mod animation;
mod item;
mod load;

pub use animation::{Animation, Easing, EndAction};
pub use item::{ItemId, ItemState, PlacedItem};
pub use load::{Completion, LoadRequest, LoadToken, RetryPolicy};

use crate::gesture::GestureEvent;
use crate::imaging::{DecodedImage, target_sides};
use crate::placement::{
    Transform, choose_fit_mode, drop_duration, drop_position, drop_rotation, fling_trajectory,
    hit_test, is_off_surface, item_bounds, pickup_duration, pickup_target, wrap_angle,
};
use kurbo::{Point, Vec2};
use load::PendingLoad;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Rotation of a freshly loaded item at its staging position.
const STAGING_ROTATION: f64 = -100.0;

/// Behavior knobs for a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    /// Most items on the table before the oldest start fading out.
    pub capacity: usize,
    /// Drop-timer period.
    pub drop_period: Duration,
    /// Loads issued on `start`.
    pub initial_drop: usize,
    /// Decode target as a fraction of the surface sides.
    pub image_ratio: f64,
    /// On-table size as a fraction of the surface sides.
    pub table_ratio: f64,
    /// Drops are rotated uniformly within `±max_rotation` degrees.
    pub max_rotation: f64,
    /// A selection older than this is dropped on the next timer tick.
    pub max_selection_time: Duration,
    pub fade_duration: Duration,
    pub fling_enabled: bool,
    /// Per-step velocity decay, in `(0, 1)`.
    pub fling_damping: f64,
    pub manual_rotation: bool,
    /// Touching empty surface with nothing selected requests exit.
    pub tap_to_exit: bool,
    pub retry: RetryPolicy,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            capacity: 12,
            drop_period: Duration::from_millis(5000),
            initial_drop: 3,
            image_ratio: 0.5,
            table_ratio: 0.3,
            max_rotation: 45.0,
            max_selection_time: Duration::from_secs(10),
            fade_duration: Duration::from_secs(1),
            fling_enabled: true,
            fling_damping: 0.2,
            manual_rotation: true,
            tap_to_exit: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl TableOptions {
    /// Scale at which dropped items rest on the table.
    pub fn table_scale(&self) -> f64 {
        self.table_ratio / self.image_ratio
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A load completed and the item entered the table.
    Placed { id: ItemId },
    Selected { id: ItemId },
    /// The item is animating back down onto the table.
    Dropped { id: ItemId },
    /// Capacity pushed the item out; it is fading.
    Evicted { id: ItemId },
    /// A fling carried the item off the surface; it is fading.
    FlungAway { id: ItemId },
    /// The item was removed and its bitmap dropped.
    Released { id: ItemId },
    LoadFailed { slot: ItemId, failures: u32 },
    /// No provider had a candidate; the slot was given up.
    LoadAbandoned { slot: ItemId },
    /// A completion arrived for a token that is no longer current.
    Discarded { token: LoadToken },
    ExitRequested,
}

/// The target of the gesture in progress.
#[derive(Debug, Clone, Copy)]
struct Capture {
    target: Option<ItemId>,
    rotate_base: f64,
}

enum Release {
    Tap,
    Up,
    Fling(Vec2),
}

pub struct Table {
    options: TableOptions,
    surface: (f64, f64),
    items: HashMap<ItemId, PlacedItem>,
    queue: VecDeque<ItemId>,
    fading: Vec<ItemId>,
    selected: Option<ItemId>,
    selected_since: Duration,
    pending: BTreeMap<ItemId, PendingLoad>,
    capture: Option<Capture>,
    started: bool,
    next_drop: Option<Duration>,
    next_id: u64,
    next_generation: u64,
    next_order: u64,
    next_z: u64,
    rng: StdRng,
    requests: Vec<LoadRequest>,
    events: Vec<TableEvent>,
}

impl Table {
    pub fn new(options: TableOptions, width: u32, height: u32, seed: u64) -> Self {
        Self {
            options,
            surface: (width as f64, height as f64),
            items: HashMap::new(),
            queue: VecDeque::new(),
            fading: Vec::new(),
            selected: None,
            selected_since: Duration::ZERO,
            pending: BTreeMap::new(),
            capture: None,
            started: false,
            next_drop: None,
            next_id: 0,
            next_generation: 0,
            next_order: 0,
            next_z: 0,
            rng: StdRng::seed_from_u64(seed),
            requests: Vec::new(),
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn surface(&self) -> (f64, f64) {
        self.surface
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Every visible item, bottom of the stack first.
    pub fn items(&self) -> Vec<&PlacedItem> {
        let mut items: Vec<&PlacedItem> = self.items.values().collect();
        items.sort_by_key(|item| item.z);
        items
    }

    pub fn item(&self, id: ItemId) -> Option<&PlacedItem> {
        self.items.get(&id)
    }

    /// On-table items, oldest `order_key` first. Excludes fading items.
    pub fn queue(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.queue.iter().copied()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn fading_len(&self) -> usize {
        self.fading.len()
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn selected_since(&self) -> Option<Duration> {
        self.selected.map(|_| self.selected_since)
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    pub fn state_of(&self, id: ItemId) -> Option<ItemState> {
        if self.pending.contains_key(&id) {
            return Some(ItemState::Loading);
        }
        self.items.get(&id).map(|item| item.state)
    }

    pub fn next_drop_at(&self) -> Option<Duration> {
        self.next_drop
    }

    /// Decode box for the current surface: `(long side, short side)`.
    pub fn target_sides(&self) -> (u32, u32) {
        target_sides(
            (self.surface.0 as u32, self.surface.1 as u32),
            self.options.image_ratio,
        )
    }

    /// Earliest time at which [`tick`](Self::tick) has something to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        let animations = self
            .items
            .values()
            .filter_map(|item| item.animation.as_ref().map(Animation::end_time));
        let retries = self.pending.values().filter_map(|p| p.retry_at);
        animations.chain(retries).chain(self.next_drop).min()
    }

    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    fn next_order(&mut self) -> u64 {
        self.next_order += 1;
        self.next_order
    }

    fn next_z(&mut self) -> u64 {
        self.next_z += 1;
        self.next_z
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    // =========================================================================
    // Drop timer and loads
    // =========================================================================

    /// Issue the initial drops and arm the drop timer. Idempotent.
    pub fn start(&mut self, now: Duration) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            width = self.surface.0,
            height = self.surface.1,
            capacity = self.options.capacity,
            "table started"
        );
        for _ in 0..self.options.initial_drop {
            self.request_load();
        }
        self.schedule_next(now);
    }

    fn schedule_next(&mut self, now: Duration) {
        self.next_drop = Some(now + self.options.drop_period);
    }

    /// Drop-timer body: drop an idle selection, or ask for another image.
    fn launch(&mut self, now: Duration) {
        self.schedule_next(now);
        let idle = self.selected.is_some_and(|_| {
            now.saturating_sub(self.selected_since) > self.options.max_selection_time
        });
        if idle {
            debug!("selection idle, dropping it");
            self.drop_selection(now);
        } else {
            self.request_load();
        }
    }

    fn request_load(&mut self) {
        self.next_id += 1;
        let slot = ItemId(self.next_id);
        let generation = self.next_generation();
        let pending = PendingLoad::new(slot, generation);
        self.pending.insert(slot, pending);
        self.issue(pending.token);
    }

    fn issue(&mut self, token: LoadToken) {
        let (long, short) = self.target_sides();
        debug!(slot = %token.slot, generation = token.generation, long, short, "requesting load");
        self.requests.push(LoadRequest {
            token,
            target_long_side: long,
            target_short_side: short,
        });
    }

    fn issue_retries(&mut self, now: Duration) {
        let due: Vec<LoadToken> = self
            .pending
            .values_mut()
            .filter(|p| p.retry_at.is_some_and(|at| now >= at))
            .map(|p| {
                p.retry_at = None;
                p.token
            })
            .collect();
        for token in due {
            self.issue(token);
        }
    }

    /// Apply a finished load. Stale tokens are discarded.
    pub fn apply_completion(&mut self, completion: Completion, now: Duration) {
        let Completion { token, result } = completion;
        let current = self.pending.get(&token.slot).map(|p| p.token);
        if current != Some(token) {
            debug!(slot = %token.slot, generation = token.generation, "discarding stale completion");
            self.events.push(TableEvent::Discarded { token });
            return;
        }

        match result {
            Ok(image) => {
                self.pending.remove(&token.slot);
                self.place(token.slot, image, now);
            }
            Err(error) if error.is_retryable() => {
                let generation = self.next_generation();
                let policy = self.options.retry;
                let Some(pending) = self.pending.get_mut(&token.slot) else {
                    return;
                };
                pending.failures += 1;
                pending.token.generation = generation;
                let delay = policy.delay(pending.failures);
                pending.retry_at = Some(now + delay);
                let failures = pending.failures;
                warn!(slot = %token.slot, failures, ?delay, %error, "load failed, retrying");
                self.events.push(TableEvent::LoadFailed {
                    slot: token.slot,
                    failures,
                });
            }
            Err(error) => {
                self.pending.remove(&token.slot);
                info!(slot = %token.slot, %error, "abandoning load slot");
                self.events.push(TableEvent::LoadAbandoned { slot: token.slot });
            }
        }
    }

    /// Put a freshly decoded image on the table, tossed in from off-surface.
    fn place(&mut self, id: ItemId, image: DecodedImage, now: Duration) {
        let (long, _) = self.target_sides();
        let staging = Transform {
            x: -(long as f64),
            y: -(long as f64),
            rotation: STAGING_ROTATION,
            ..Transform::default()
        };
        let size = (image.width() as f64, image.height() as f64);
        let item = PlacedItem {
            id,
            image,
            transform: staging,
            state: ItemState::Placed,
            order_key: self.next_order(),
            z: self.next_z(),
            fit: choose_fit_mode(self.surface, size),
            animation: None,
        };
        info!(id = %id, width = size.0, height = size.1, "placing item");
        self.items.insert(id, item);
        self.queue.push_back(id);
        if let Some(selected) = self.selected {
            self.raise(selected);
        }
        self.toss(id, now);
        self.events.push(TableEvent::Placed { id });
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Advance animations, fire due retries and the drop timer.
    pub fn tick(&mut self, now: Duration) {
        let mut finished = Vec::new();
        for item in self.items.values_mut() {
            let Some(animation) = item.animation.as_ref() else {
                continue;
            };
            let transform = animation.sample(now);
            let done = animation.is_finished(now);
            let end = (animation.end_time(), item.id, animation.end);
            item.transform = transform;
            if done {
                item.animation = None;
                finished.push(end);
            }
        }
        finished.sort_by_key(|(at, id, _)| (*at, *id));
        for (at, id, action) in finished {
            self.finish(id, action, at);
        }

        self.issue_retries(now);

        if self.started && self.next_drop.is_some_and(|at| now >= at) {
            debug!("drop timer fired");
            self.launch(now);
        }
    }

    fn finish(&mut self, id: ItemId, action: EndAction, at: Duration) {
        match action {
            EndAction::Rest => {}
            EndAction::Settle => {
                if let Some(item) = self.items.get_mut(&id)
                    && item.state == ItemState::Dropping
                {
                    item.state = ItemState::Placed;
                }
                self.evict(at);
            }
            EndAction::FadeAway => {
                info!(id = %id, "flung off the table");
                self.queue.retain(|queued| *queued != id);
                if self.selected == Some(id) {
                    self.selected = None;
                }
                self.begin_fade(id, at);
                self.events.push(TableEvent::FlungAway { id });
                self.launch(at);
            }
            EndAction::Remove => self.remove(id),
        }
    }

    fn set_animation(
        &mut self,
        id: ItemId,
        to: Transform,
        now: Duration,
        duration: Duration,
        easing: Easing,
        end: EndAction,
    ) {
        if let Some(item) = self.items.get_mut(&id) {
            item.animation = Some(Animation::new(item.transform, to, now, duration, easing, end));
        }
    }

    /// Animate `id` to a fresh random drop spot at table scale.
    fn toss(&mut self, id: ItemId, now: Duration) {
        let scale = self.options.table_scale();
        let surface = self.surface;
        let limit = self.options.max_rotation;
        let Some(item) = self.items.get(&id) else {
            return;
        };
        let from = item.transform;
        let size = item.size();
        let position = drop_position(surface, size, &mut self.rng);
        let rotation = drop_rotation(limit, &mut self.rng);
        let to = Transform {
            x: position.x,
            y: position.y,
            rotation,
            scale,
            alpha: 1.0,
        };
        let duration = drop_duration(from.position().distance(position));
        debug!(id = %id, x = position.x, y = position.y, rotation, ?duration, "tossing");
        self.set_animation(id, to, now, duration, Easing::Decelerate, EndAction::Settle);
    }

    /// `Selected`/`Placed` → `Dropping`, tossed to a new spot.
    fn drop_on_table(&mut self, id: ItemId, now: Duration) {
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        if item.state == ItemState::FadingOut {
            return;
        }
        item.state = ItemState::Dropping;
        self.toss(id, now);
        self.events.push(TableEvent::Dropped { id });
    }

    fn drop_selection(&mut self, now: Duration) {
        if let Some(id) = self.selected.take() {
            self.drop_on_table(id, now);
            self.schedule_next(now);
        }
    }

    /// Animate `id` to the centered, enlarged pickup pose.
    fn pick_up(&mut self, id: ItemId, now: Duration) {
        let surface = self.surface;
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        item.transform.rotation = wrap_angle(item.transform.rotation);
        let target = pickup_target(surface, item.size());
        let to = Transform {
            x: target.position.x,
            y: target.position.y,
            rotation: 0.0,
            scale: target.scale,
            alpha: 1.0,
        };
        let duration = pickup_duration(item.transform.position().distance(target.position));
        self.set_animation(id, to, now, duration, Easing::Decelerate, EndAction::Rest);
    }

    fn select(&mut self, id: ItemId, now: Duration) {
        if let Some(previous) = self.selected.take()
            && previous != id
        {
            self.drop_on_table(previous, now);
        }
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        item.state = ItemState::Selected;
        self.selected = Some(id);
        self.selected_since = now;
        self.raise(id);
        self.pick_up(id, now);
        info!(id = %id, "selected");
        self.events.push(TableEvent::Selected { id });
    }

    fn fling(&mut self, id: ItemId, velocity: Vec2, now: Duration) {
        let speed = velocity.hypot();
        let trajectory = fling_trajectory(speed, self.options.fling_damping);
        if trajectory.stop_distance <= 0.0 {
            return;
        }
        let surface = self.surface;
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        item.animation = None;
        if item.state == ItemState::Dropping {
            item.state = ItemState::Placed;
        }
        let direction = velocity / speed;
        let mut to = item.transform;
        to.x += direction.x * trajectory.stop_distance;
        to.y += direction.y * trajectory.stop_distance;
        let (w, h) = item.size();
        let away = is_off_surface(item_bounds(&to, w, h), surface.0, surface.1);
        debug!(
            id = %id,
            speed,
            steps = trajectory.steps,
            distance = trajectory.stop_distance,
            away,
            "fling"
        );
        let end = if away { EndAction::FadeAway } else { EndAction::Rest };
        self.set_animation(id, to, now, trajectory.duration(), Easing::Decelerate, end);
    }

    // =========================================================================
    // Eviction and removal
    // =========================================================================

    fn evict(&mut self, at: Duration) {
        while self.queue.len() > self.options.capacity {
            let selected = self.selected;
            let Some(index) = self.queue.iter().position(|id| Some(*id) != selected) else {
                break;
            };
            let Some(id) = self.queue.remove(index) else {
                break;
            };
            debug!(id = %id, on_table = self.queue.len(), "evicting");
            self.begin_fade(id, at);
            self.events.push(TableEvent::Evicted { id });
        }
    }

    fn begin_fade(&mut self, id: ItemId, at: Duration) {
        let fade = self.options.fade_duration;
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        item.state = ItemState::FadingOut;
        let to = Transform {
            alpha: 0.0,
            ..item.transform
        };
        self.fading.push(id);
        self.set_animation(id, to, at, fade, Easing::Linear, EndAction::Remove);
    }

    fn remove(&mut self, id: ItemId) {
        self.queue.retain(|queued| *queued != id);
        self.fading.retain(|fading| *fading != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if let Some(item) = self.items.remove(&id) {
            debug!(id = %id, "releasing bitmap");
            drop(item);
            self.events.push(TableEvent::Released { id });
        }
    }

    /// Remove everything and cancel every pending load.
    ///
    /// Returns the number of bitmaps released. Completions that arrive
    /// afterwards no longer match a slot and are discarded.
    pub fn shutdown(&mut self) -> usize {
        self.started = false;
        self.next_drop = None;
        self.capture = None;
        self.selected = None;
        let cancelled = self.pending.len();
        self.pending.clear();
        self.requests.clear();

        let mut ids: Vec<ItemId> = self.items.keys().copied().collect();
        ids.sort();
        let released = ids.len();
        for id in ids {
            self.remove(id);
        }
        info!(released, cancelled, "table shut down");
        released
    }

    // =========================================================================
    // Surface
    // =========================================================================

    /// Re-drop every on-table item for the new bounds; re-center the selection.
    pub fn on_surface_resized(&mut self, width: u32, height: u32, now: Duration) {
        let surface = (width as f64, height as f64);
        if surface == self.surface {
            return;
        }
        info!(width, height, "surface resized");
        self.surface = surface;

        let on_table: Vec<ItemId> = self.queue.iter().copied().collect();
        for id in on_table {
            if self.selected == Some(id) {
                self.pick_up(id, now);
            } else {
                self.drop_on_table(id, now);
            }
        }
        for item in self.items.values_mut() {
            item.fit = choose_fit_mode(surface, item.size());
        }
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    fn raise(&mut self, id: ItemId) {
        let z = self.next_z();
        if let Some(item) = self.items.get_mut(&id) {
            item.z = z;
        }
    }

    /// Move to the back of the eviction order and to the top of the stack.
    fn touch(&mut self, id: ItemId) {
        let order = self.next_order();
        if let Some(item) = self.items.get_mut(&id) {
            item.order_key = order;
        }
        self.raise(id);
        self.queue.retain(|queued| *queued != id);
        self.queue.push_back(id);
    }

    /// Topmost on-table item under `pos`.
    fn hit(&self, pos: Point) -> Option<ItemId> {
        self.queue
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| {
                let (w, h) = item.size();
                hit_test(&item.transform, w, h, pos)
            })
            .max_by_key(|item| item.z)
            .map(|item| item.id)
    }

    /// Captured target, if it is still on the table.
    fn live_target(&self) -> Option<ItemId> {
        let id = self.capture?.target?;
        let item = self.items.get(&id)?;
        (item.state != ItemState::FadingOut).then_some(id)
    }

    pub fn handle_gesture(&mut self, gesture: &GestureEvent, now: Duration) {
        match *gesture {
            GestureEvent::Down { pos } => self.touch_down(pos, now),
            GestureEvent::Move { delta, .. } => self.drag(delta),
            GestureEvent::MultiRotate { degrees } => self.rotate(degrees),
            GestureEvent::RotateEnd => {
                let rotation = self
                    .live_target()
                    .and_then(|id| self.items.get(&id))
                    .map(|item| item.transform.rotation);
                if let (Some(capture), Some(rotation)) = (self.capture.as_mut(), rotation) {
                    capture.rotate_base = rotation;
                }
            }
            GestureEvent::Tap { .. } => self.release(Release::Tap, now),
            GestureEvent::Up { .. } => self.release(Release::Up, now),
            GestureEvent::Fling { velocity, .. } => self.release(Release::Fling(velocity), now),
        }
    }

    fn touch_down(&mut self, pos: Point, now: Duration) {
        match self.hit(pos) {
            Some(id) => {
                self.touch(id);
                let rotate_base = self.items.get(&id).map_or(0.0, |i| i.transform.rotation);
                self.capture = Some(Capture {
                    target: Some(id),
                    rotate_base,
                });
            }
            None => {
                self.capture = Some(Capture {
                    target: None,
                    rotate_base: 0.0,
                });
                if self.selected.is_some() {
                    self.drop_selection(now);
                } else if self.options.tap_to_exit {
                    info!("exit requested");
                    self.events.push(TableEvent::ExitRequested);
                }
            }
        }
    }

    /// Unselected targets follow the pointer; their animation is cancelled.
    fn drag(&mut self, delta: Vec2) {
        let Some(id) = self.live_target() else {
            return;
        };
        if self.selected == Some(id) {
            return;
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.animation = None;
            if item.state == ItemState::Dropping {
                item.state = ItemState::Placed;
            }
            item.transform.x += delta.x;
            item.transform.y += delta.y;
        }
    }

    fn rotate(&mut self, degrees: f64) {
        if !self.options.manual_rotation {
            return;
        }
        let Some(id) = self.live_target() else {
            return;
        };
        if self.selected == Some(id) {
            return;
        }
        let base = self.capture.map_or(0.0, |c| c.rotate_base);
        if let Some(item) = self.items.get_mut(&id) {
            item.animation = None;
            item.transform.rotation = base + degrees;
        }
    }

    fn release(&mut self, release: Release, now: Duration) {
        let target = self.live_target();
        self.capture = None;
        let Some(id) = target else {
            return;
        };
        if self.selected == Some(id) {
            self.drop_selection(now);
            return;
        }
        match release {
            Release::Tap => self.select(id, now),
            Release::Fling(velocity) if self.options.fling_enabled => self.fling(id, velocity, now),
            Release::Fling(_) | Release::Up => {}
        }
    }
}
