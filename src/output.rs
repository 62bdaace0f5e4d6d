//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Albums
//!
//! ```text
//! Albums
//! 001 Travel [on]
//!     Id: local:Travel
//!     Thumbnail: file:///photos/Travel/lisbon.jpg
//! 002 Default [on]
//!     Id: stock:default
//! ```
//!
//! ## Run
//!
//! Table events are printed as they happen, then a snapshot of the table and
//! a summary:
//!
//! ```text
//! #1 placed
//! #1 selected
//! #4 evicted
//! #4 released
//!
//! Table (1000x800)
//!     #1 placed 500x375 at (221.4, 180.2) rot -12.0° scale 0.60
//!
//! Placed 5, evicted 1, flung 0, released 5, load failures 2, abandoned 0
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::PhotoTableConfig;
use crate::source::{AlbumData, AlbumSettings};
use crate::table::{ItemState, Table, TableEvent};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn state_label(state: ItemState) -> &'static str {
    match state {
        ItemState::Loading => "loading",
        ItemState::Placed => "placed",
        ItemState::Selected => "selected",
        ItemState::Dropping => "dropping",
        ItemState::FadingOut => "fading",
    }
}

// ============================================================================
// Albums
// ============================================================================

/// Format the album list with each album's enabled state.
pub fn format_albums(albums: &[AlbumData], settings: &AlbumSettings) -> Vec<String> {
    let mut lines = vec!["Albums".to_string()];
    if albums.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }
    for (i, album) in albums.iter().enumerate() {
        let status = if settings.allows(&album.id) { "on" } else { "off" };
        lines.push(format!("{} {} [{}]", format_index(i + 1), album.title, status));
        lines.push(format!("{}Id: {}", indent(1), album.id));
        if let Some(url) = &album.thumbnail_url {
            lines.push(format!("{}Thumbnail: {}", indent(1), url));
        }
    }
    lines
}

pub fn print_albums(albums: &[AlbumData], settings: &AlbumSettings) {
    for line in format_albums(albums, settings) {
        println!("{}", line);
    }
}

// ============================================================================
// Run
// ============================================================================

/// One display line per table event. Discarded completions are not shown.
pub fn format_table_event(event: &TableEvent) -> Option<String> {
    let line = match event {
        TableEvent::Placed { id } => format!("{id} placed"),
        TableEvent::Selected { id } => format!("{id} selected"),
        TableEvent::Dropped { id } => format!("{id} dropped"),
        TableEvent::Evicted { id } => format!("{id} evicted"),
        TableEvent::FlungAway { id } => format!("{id} flung away"),
        TableEvent::Released { id } => format!("{id} released"),
        TableEvent::LoadFailed { slot, failures } => {
            format!("{slot} load failed ({failures}x), retrying")
        }
        TableEvent::LoadAbandoned { slot } => format!("{slot} no image available"),
        TableEvent::ExitRequested => "exit requested".to_string(),
        TableEvent::Discarded { .. } => return None,
    };
    Some(line)
}

/// Event tallies for the end-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub placed: usize,
    pub evicted: usize,
    pub flung: usize,
    pub released: usize,
    pub load_failures: usize,
    pub abandoned: usize,
}

impl RunSummary {
    pub fn record(&mut self, event: &TableEvent) {
        match event {
            TableEvent::Placed { .. } => self.placed += 1,
            TableEvent::Evicted { .. } => self.evicted += 1,
            TableEvent::FlungAway { .. } => self.flung += 1,
            TableEvent::Released { .. } => self.released += 1,
            TableEvent::LoadFailed { .. } => self.load_failures += 1,
            TableEvent::LoadAbandoned { .. } => self.abandoned += 1,
            _ => {}
        }
    }
}

/// Format the items on the table, bottom of the stack first.
pub fn format_table(table: &Table) -> Vec<String> {
    let (w, h) = table.surface();
    let mut lines = vec![format!("Table ({w}x{h})")];
    for item in table.items() {
        let t = item.transform();
        lines.push(format!(
            "{}{} {} {}x{} at ({:.1}, {:.1}) rot {:.1}° scale {:.2}",
            indent(1),
            item.id(),
            state_label(item.state()),
            item.width(),
            item.height(),
            t.x,
            t.y,
            t.rotation,
            t.scale
        ));
    }
    lines
}

pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    vec![format!(
        "Placed {}, evicted {}, flung {}, released {}, load failures {}, abandoned {}",
        summary.placed,
        summary.evicted,
        summary.flung,
        summary.released,
        summary.load_failures,
        summary.abandoned
    )]
}

pub fn print_table(table: &Table) {
    for line in format_table(table) {
        println!("{}", line);
    }
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Summarize a validated config and the albums it makes available.
pub fn format_check_output(config: &PhotoTableConfig, albums: &[AlbumData]) -> Vec<String> {
    let table = &config.table;
    let mut lines = vec![
        "Table".to_string(),
        format!(
            "{}capacity {}, drop every {}ms, {} initial",
            indent(1),
            table.capacity,
            table.drop_period_ms,
            table.initial_drop
        ),
        "Sources".to_string(),
    ];
    if config.sources.local_roots.is_empty() {
        lines.push(format!("{}local: (no roots)", indent(1)));
    }
    for root in &config.sources.local_roots {
        let status = if root.is_dir() { "ok" } else { "missing" };
        lines.push(format!("{}local: {} ({})", indent(1), root.display(), status));
    }
    lines.push(format!(
        "{}stock: {} images at {}x{}",
        indent(1),
        config.sources.stock_count,
        config.sources.stock_width,
        config.sources.stock_height
    ));
    lines.push(format!("{}{} albums available", indent(1), albums.len()));
    lines
}

pub fn print_check_output(config: &PhotoTableConfig, albums: &[AlbumData]) {
    for line in format_check_output(config, albums) {
        println!("{}", line);
    }
}
