//! Host runtime: drives a [`Table`] from one scheduling thread and runs loads
//! on a worker pool.
//!
//! ```text
//!   pointer events ──▶ GestureInterpreter ──▶ Table ──▶ LoadRequest
//!                                              ▲            │
//!                                  pump()      │            ▼ rayon pool
//!                           mpsc::Receiver ◀── Completion ◀─ ImageSupplier::next
//! ```
//!
//! The table is only touched on the thread that owns the `Runtime`. Workers
//! hold nothing but an `Arc` to the supplier and a channel sender; every
//! decoded bitmap travels back inside a [`Completion`] and is either placed
//! or discarded by the table.
//!
//! [`Runtime::shutdown`] releases every on-table bitmap, then blocks until
//! the in-flight counter drops to zero, discarding each late completion.

use crate::gesture::{GestureInterpreter, GestureThresholds, PointerEvent};
use crate::source::ImageSupplier;
use crate::table::{Completion, Table, TableEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// How long `shutdown` waits on the channel before re-checking the counter.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What [`Runtime::shutdown`] cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Bitmaps that were on the table.
    pub released: usize,
    /// Completions that arrived after shutdown began, or were never applied.
    pub discarded: usize,
    /// Every event the table emitted during shutdown.
    pub events: Vec<TableEvent>,
}

pub struct Runtime {
    table: Table,
    gestures: GestureInterpreter,
    pool: rayon::ThreadPool,
    supplier: Arc<dyn ImageSupplier>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    ready: Vec<Completion>,
    in_flight: Arc<AtomicUsize>,
    epoch: Instant,
}

impl Runtime {
    pub fn new(
        table: Table,
        thresholds: GestureThresholds,
        supplier: Arc<dyn ImageSupplier>,
        threads: usize,
    ) -> Result<Self, RuntimeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("phototable-load-{i}"))
            .build()?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            table,
            gestures: GestureInterpreter::new(thresholds),
            pool,
            supplier,
            sender,
            receiver,
            ready: Vec::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            epoch: Instant::now(),
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Time since the runtime was created; the table's clock.
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Loads currently running or queued on the pool.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn start(&mut self) {
        let now = self.now();
        self.table.start(now);
        self.dispatch();
    }

    pub fn on_surface_resized(&mut self, width: u32, height: u32) {
        let now = self.now();
        self.table.on_surface_resized(width, height, now);
        self.dispatch();
    }

    /// Feed one raw pointer event.
    ///
    /// The event's `time` only drives tap and velocity detection; the table
    /// applies the resulting gestures on the runtime clock, so hosts may
    /// timestamp pointers with any monotonic source.
    pub fn on_gesture_event(&mut self, event: &PointerEvent) {
        let now = self.now();
        for gesture in self.gestures.on_event(event) {
            debug!(?gesture, "gesture");
            self.table.handle_gesture(&gesture, now);
        }
        self.dispatch();
    }

    /// Block up to `timeout` for one completion. Returns whether one arrived;
    /// it is applied on the next [`pump`](Self::pump).
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.ready.push(completion);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Apply arrived completions, advance the table and start new loads.
    pub fn pump(&mut self) -> Vec<TableEvent> {
        let now = self.now();
        self.pump_at(now)
    }

    /// [`pump`](Self::pump) with an explicit clock reading.
    pub fn pump_at(&mut self, now: Duration) -> Vec<TableEvent> {
        let mut arrived = std::mem::take(&mut self.ready);
        arrived.extend(self.receiver.try_iter());
        for completion in arrived {
            self.table.apply_completion(completion, now);
        }
        self.table.tick(now);
        self.dispatch();
        self.table.take_events()
    }

    fn dispatch(&mut self) {
        for request in self.table.take_requests() {
            let supplier = Arc::clone(&self.supplier);
            let sender = self.sender.clone();
            let in_flight = Arc::clone(&self.in_flight);
            in_flight.fetch_add(1, Ordering::SeqCst);
            debug!(slot = %request.token.slot, "dispatching load");
            self.pool.spawn(move || {
                let result = supplier.next(request.target_long_side, request.target_short_side);
                // The receiver outlives every worker unless the runtime was leaked
                let _ = sender.send(Completion {
                    token: request.token,
                    result,
                });
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }

    /// Release everything and wait for in-flight loads to finish.
    pub fn shutdown(mut self) -> ShutdownReport {
        let now = self.now();
        let released = self.table.shutdown();
        info!(released, in_flight = self.in_flight(), "shutting down");

        let mut late = std::mem::take(&mut self.ready);
        loop {
            late.extend(self.receiver.try_iter());
            if self.in_flight() == 0 {
                // A worker decrements after sending, so its completion is queued
                late.extend(self.receiver.try_iter());
                break;
            }
            if let Ok(completion) = self.receiver.recv_timeout(SHUTDOWN_POLL) {
                late.push(completion);
            }
        }

        let discarded = late.len();
        for completion in late {
            self.table.apply_completion(completion, now);
        }
        info!(released, discarded, "shutdown complete");
        ShutdownReport {
            released,
            discarded,
            events: self.table.take_events(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::PointerAction;
    use crate::imaging::DecodedImage;
    use crate::source::LoadError;
    use crate::table::{ItemState, RetryPolicy, TableOptions};
    use crate::test_helpers::{ScriptedSupplier, decoded, ms, retryable};
    use kurbo::Point;

    fn options() -> TableOptions {
        TableOptions {
            initial_drop: 2,
            drop_period: Duration::from_secs(3600),
            retry: RetryPolicy::fixed(ms(5)),
            ..TableOptions::default()
        }
    }

    fn runtime(options: TableOptions, supplier: Arc<dyn ImageSupplier>) -> Runtime {
        let table = Table::new(options, 1000, 800, 11);
        Runtime::new(table, GestureThresholds::default(), supplier, 2).unwrap()
    }

    /// Pump until `done` holds for the collected events, or panic after 5s.
    fn pump_until(runtime: &mut Runtime, done: impl Fn(&[TableEvent]) -> bool) -> Vec<TableEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while !done(&events) {
            assert!(Instant::now() < deadline, "timed out; events so far: {events:?}");
            runtime.wait(ms(10));
            events.extend(runtime.pump());
        }
        events
    }

    fn placed(events: &[TableEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TableEvent::Placed { .. }))
            .count()
    }

    #[test]
    fn start_places_initial_drops() {
        let supplier = Arc::new(ScriptedSupplier::repeating(2, 40, 30));
        let mut runtime = runtime(options(), supplier.clone());
        runtime.start();
        pump_until(&mut runtime, |events| placed(events) == 2);

        assert_eq!(runtime.table().items().len(), 2);
        assert_eq!(runtime.table().pending_loads(), 0);
        assert_eq!(supplier.calls(), 2);
        assert_eq!(runtime.in_flight(), 0);
    }

    #[test]
    fn retries_until_the_load_succeeds() {
        let supplier = Arc::new(ScriptedSupplier::new(vec![
            Err(retryable()),
            Err(retryable()),
            Err(retryable()),
            Ok((40, 30)),
        ]));
        let options = TableOptions {
            initial_drop: 1,
            ..options()
        };
        let mut runtime = runtime(options, supplier.clone());
        runtime.start();
        let events = pump_until(&mut runtime, |events| placed(events) == 1);

        let failures = events
            .iter()
            .filter(|e| matches!(e, TableEvent::LoadFailed { .. }))
            .count();
        assert_eq!(failures, 3);
        assert_eq!(supplier.calls(), 4);
    }

    #[test]
    fn exhausted_supply_abandons_slots() {
        let supplier = Arc::new(ScriptedSupplier::new(Vec::new()));
        let mut runtime = runtime(options(), supplier);
        runtime.start();
        let events = pump_until(&mut runtime, |events| {
            events
                .iter()
                .filter(|e| matches!(e, TableEvent::LoadAbandoned { .. }))
                .count()
                == 2
        });
        assert_eq!(placed(&events), 0);
        assert_eq!(runtime.table().pending_loads(), 0);
    }

    struct SlowSupplier;

    impl ImageSupplier for SlowSupplier {
        fn next(&self, _long: u32, _short: u32) -> Result<DecodedImage, LoadError> {
            std::thread::sleep(ms(100));
            Ok(decoded(20, 20))
        }
    }

    #[test]
    fn shutdown_waits_for_in_flight_loads() {
        let mut runtime = runtime(options(), Arc::new(SlowSupplier));
        runtime.start();
        assert_eq!(runtime.in_flight(), 2);

        let report = runtime.shutdown();
        assert_eq!(report.released, 0);
        assert_eq!(report.discarded, 2);
        let discarded = report
            .events
            .iter()
            .filter(|e| matches!(e, TableEvent::Discarded { .. }))
            .count();
        assert_eq!(discarded, 2);
    }

    #[test]
    fn shutdown_releases_placed_items() {
        let supplier = Arc::new(ScriptedSupplier::repeating(2, 40, 30));
        let mut runtime = runtime(options(), supplier);
        runtime.start();
        pump_until(&mut runtime, |events| placed(events) == 2);

        let report = runtime.shutdown();
        assert_eq!(report.released, 2);
        assert_eq!(report.discarded, 0);
    }

    #[test]
    fn pointer_events_reach_the_table() {
        let options = TableOptions {
            initial_drop: 0,
            tap_to_exit: true,
            ..options()
        };
        let mut runtime = runtime(options, Arc::new(ScriptedSupplier::new(Vec::new())));
        runtime.start();
        let pos = Point::new(10.0, 10.0);
        runtime.on_gesture_event(&PointerEvent::single(ms(0), PointerAction::Down, pos));
        runtime.on_gesture_event(&PointerEvent::single(ms(20), PointerAction::Up, pos));
        let events = runtime.pump();
        assert_eq!(events, vec![TableEvent::ExitRequested]);
    }

    #[test]
    fn pointer_clock_does_not_leak_into_the_table() {
        let options = TableOptions {
            initial_drop: 1,
            drop_period: ms(200),
            max_selection_time: ms(100),
            ..options()
        };
        let supplier = Arc::new(ScriptedSupplier::repeating(1, 40, 30));
        let table = Table::new(options, 200, 150, 11);
        let mut runtime = Runtime::new(table, GestureThresholds::default(), supplier, 1).unwrap();
        runtime.start();
        pump_until(&mut runtime, |events| placed(events) == 1);
        let id = runtime.table().items()[0].id();
        let settled = Instant::now() + Duration::from_secs(10);
        while runtime.table().state_of(id) != Some(ItemState::Placed) {
            assert!(Instant::now() < settled, "drop never settled");
            runtime.wait(ms(10));
            runtime.pump();
        }
        let center = runtime.table().item(id).unwrap().transform().center(40.0, 30.0);

        // Host timestamps an hour ahead of the runtime clock
        let host = Duration::from_secs(3600);
        runtime.on_gesture_event(&PointerEvent::single(host, PointerAction::Down, center));
        runtime.on_gesture_event(&PointerEvent::single(host + ms(20), PointerAction::Up, center));
        assert_eq!(runtime.table().selected(), Some(id));
        let since = runtime.table().selected_since().unwrap();
        assert!(since <= runtime.now());

        // The idle selection is dropped by the drop timer
        pump_until(&mut runtime, |events| {
            events.contains(&TableEvent::Dropped { id })
        });
        assert_eq!(runtime.table().selected(), None);
    }

    #[test]
    fn resize_updates_load_targets() {
        let supplier = Arc::new(ScriptedSupplier::new(Vec::new()));
        let mut runtime = runtime(options(), supplier);
        runtime.on_surface_resized(2000, 1000);
        assert_eq!(runtime.table().target_sides(), (1000, 500));
    }
}
