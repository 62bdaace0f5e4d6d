//! Providers, façade, decoder and runtime wired together the way the binary
//! wires them.

use image::{Rgba, RgbaImage};
use phototable::gesture::GestureThresholds;
use phototable::imaging::RustDecoder;
use phototable::runtime::Runtime;
use phototable::source::{
    AlbumSettings, Catalog, ImageSupplier, LocalCatalog, QueuedSource, SourcePlexor, StockCatalog,
};
use phototable::table::{Table, TableEvent, TableOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn stock(count: usize) -> QueuedSource<Box<dyn Catalog>> {
    let catalog: Box<dyn Catalog> = Box::new(StockCatalog::new(count, 64, 48));
    QueuedSource::new(catalog, 8, 1)
}

fn local(root: &Path, settings: &AlbumSettings) -> QueuedSource<Box<dyn Catalog>> {
    let catalog: Box<dyn Catalog> = Box::new(LocalCatalog::new(vec![root.to_path_buf()], settings));
    QueuedSource::new(catalog, 8, 2)
}

fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]))
        .save(path)
        .unwrap();
}

/// `Photos/` with two root images (30x20) and a `Travel` album (10x10).
fn photo_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("Photos");
    write_png(&root.join("a.png"), 30, 20);
    write_png(&root.join("b.png"), 30, 20);
    write_png(&root.join("Travel/c.png"), 10, 10);
    tmp
}

#[test]
fn local_photos_take_priority_over_stock() {
    let tmp = photo_tree();
    let settings = AlbumSettings::default();
    let plexor = SourcePlexor::new(RustDecoder::new())
        .with_local(local(&tmp.path().join("Photos"), &settings))
        .with_stock(stock(4));

    for _ in 0..6 {
        let image = plexor.next(800, 600).unwrap();
        assert_ne!(image.dimensions().as_tuple(), (64, 48), "stock image served");
    }
}

#[test]
fn stock_fills_in_when_local_is_empty() {
    let tmp = TempDir::new().unwrap();
    let settings = AlbumSettings::default();
    let plexor = SourcePlexor::new(RustDecoder::new())
        .with_local(local(tmp.path(), &settings))
        .with_stock(stock(4));

    let image = plexor.next(800, 600).unwrap();
    let (w, h) = image.dimensions().as_tuple();
    // Stock alternates landscape and portrait
    assert!((w, h) == (64, 48) || (w, h) == (48, 64));
}

#[test]
fn enabled_album_set_persists_and_filters() {
    let tmp = photo_tree();
    let settings_path = tmp.path().join("state/albums.json");

    let mut settings = AlbumSettings::load(&settings_path).unwrap();
    settings.set_album_enabled("local:Travel", true).unwrap();

    let reloaded = AlbumSettings::load(&settings_path).unwrap();
    assert!(reloaded.allows("local:Travel"));
    assert!(!reloaded.allows("local:Photos"));
    // Other providers are unaffected
    assert!(reloaded.allows("stock:default"));

    let plexor =
        SourcePlexor::new(RustDecoder::new()).with_local(local(&tmp.path().join("Photos"), &reloaded));
    for _ in 0..3 {
        let image = plexor.next(800, 600).unwrap();
        assert_eq!(image.dimensions().as_tuple(), (10, 10));
    }

    let albums = plexor.albums().unwrap();
    let ids: Vec<_> = albums.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["local:Photos", "local:Travel"]);
}

#[test]
fn runtime_places_stock_photos_and_shuts_down_cleanly() {
    let options = TableOptions {
        capacity: 3,
        initial_drop: 4,
        drop_period: Duration::from_secs(3600),
        ..TableOptions::default()
    };
    let table = Table::new(options, 400, 300, 5);
    let plexor = SourcePlexor::new(RustDecoder::new()).with_stock(stock(6));
    let mut runtime = Runtime::new(table, GestureThresholds::default(), Arc::new(plexor), 2).unwrap();
    runtime.start();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    let placed = |events: &[TableEvent]| {
        events
            .iter()
            .filter(|e| matches!(e, TableEvent::Placed { .. }))
            .count()
    };
    while placed(&events) < 4 {
        assert!(Instant::now() < deadline, "timed out: {events:?}");
        runtime.wait(Duration::from_millis(20));
        events.extend(runtime.pump());
    }

    // Decoded to at most half the surface
    let (long, short) = runtime.table().target_sides();
    assert_eq!((long, short), (200, 150));
    for item in runtime.table().items() {
        assert!(item.width().max(item.height()) <= long);
    }

    let report = runtime.shutdown();
    events.extend(report.events);
    let released = events
        .iter()
        .filter(|e| matches!(e, TableEvent::Released { .. }))
        .count();
    assert_eq!(released, 4);
}
