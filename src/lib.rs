//! # Phototable
//!
//! An ambient photo table. Photos from the configured providers drop onto a
//! display surface at a random spot and angle, pile up, and fade out once the
//! table is full. A viewer can pick one up (it is centered and enlarged),
//! drag and rotate the ones lying on the table, or fling them away.
//!
//! # Architecture
//!
//! ```text
//!  providers ──▶ SourcePlexor ──▶ ImageDecoder          (worker threads)
//!                      │
//!                      ▼ Completion
//!  pointer ──▶ GestureInterpreter ──▶ Table ──▶ events  (scheduling thread)
//!                                       │
//!                                       └──▶ placement math
//! ```
//!
//! The [`table::Table`] is a deterministic state machine: it never blocks and
//! never reads a clock, so every behavior (eviction, retries, drop timing,
//! gestures) is unit-testable with explicit timestamps. The
//! [`runtime::Runtime`] wraps it with a `rayon` worker pool and an `mpsc`
//! completion channel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`table`] | Item lifecycle, eviction queue, load tokens and retries, gesture handling |
//! | [`runtime`] | Worker pool, completion channel, shutdown that waits for in-flight loads |
//! | [`gesture`] | Raw pointer events → down / move / rotate / tap / fling |
//! | [`placement`] | Drop scatter, fling projection, pickup pose, hit testing, fit mode |
//! | [`source`] | Providers (local directories, stock), prefetch queues, the supplier façade, album settings |
//! | [`imaging`] | Bounds, subsampled decode, resize and orientation with the `image` crate |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Orientation
//!
//! A provider's orientation tag is the clockwise rotation of the stored
//! pixels. The decoder rotates by the negative of it, and reports the
//! dimensions after rotation.
//!
//! ## Unclamped Drops
//!
//! Drop positions are scattered around the surface center with a normal
//! distribution and are not clamped. An item occasionally lands partly off
//! the edge, which reads as a natural pile.
//!
//! ## Provider Aggregation
//!
//! Remote and local take turns: each supplier call starts with the one the
//! previous call did not, and falls back to the other. Stock is a fallback
//! only, never mixed in while remote or local has candidates.

pub mod config;
pub mod gesture;
pub mod imaging;
pub mod output;
pub mod placement;
pub mod runtime;
pub mod source;
pub mod table;

#[cfg(test)]
pub(crate) mod test_helpers;
