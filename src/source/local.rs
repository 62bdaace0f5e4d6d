//! Local-storage provider.
//!
//! Walks one or more root directories. Every directory that directly holds
//! images is an album, identified as `local:<path relative to its root>`
//! (images sitting in the root itself belong to `local:<root name>`).
//!
//! ```text
//! Pictures/                    root
//! ├── beach.jpg                → local:Pictures
//! ├── Travel/
//! │   ├── 001.jpg              → local:Travel
//! │   └── Lisbon/
//! │       └── tram.png         → local:Travel/Lisbon
//! └── .thumbnails/             skipped (hidden)
//! ```
//!
//! The enabled album set is snapshotted at construction; toggles made later
//! take effect the next time a catalog is built.
//!
//! Each candidate's orientation comes from its EXIF tag, read from the file
//! header at query time. Files without one are upright.

use super::settings::AlbumSettings;
use super::{AlbumData, Catalog, ImageRef, ProviderKind, SourceError};
use crate::imaging::Orientation;
use image::{ImageDecoder as _, ImageReader, ImageResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

pub struct LocalCatalog {
    roots: Vec<PathBuf>,
    settings: AlbumSettings,
}

/// One image found on disk, before album filtering.
struct Found {
    path: PathBuf,
    album_id: String,
    title: String,
    modified: u64,
}

impl LocalCatalog {
    pub fn new(roots: Vec<PathBuf>, settings: &AlbumSettings) -> Self {
        Self {
            roots,
            settings: settings.clone(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn walk(&self) -> Vec<Found> {
        let mut found = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                warn!(root = %root.display(), "local root is not a directory, skipping");
                continue;
            }
            let walker = WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!(error = %e, "unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !is_image(entry.path()) {
                    continue;
                }
                let (album_id, title) = album_for(root, entry.path());
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_secs());
                found.push(Found {
                    path: entry.into_path(),
                    album_id,
                    title,
                    modified,
                });
            }
        }
        found
    }
}

fn exif_orientation(path: &Path) -> ImageResult<image::metadata::Orientation> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    decoder.orientation()
}

/// Stored rotation of the image at `path`; upright when it cannot be read.
pub(crate) fn read_orientation(path: &Path) -> Orientation {
    match exif_orientation(path) {
        Ok(exif) => {
            let orientation = Orientation::from(exif);
            if !orientation.is_upright() {
                debug!(path = %path.display(), degrees = orientation.degrees(), "rotated image");
            }
            orientation
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no orientation, assuming upright");
            Orientation::default()
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

pub(crate) fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Album id and title for an image under `root`.
fn album_for(root: &Path, image: &Path) -> (String, String) {
    let parent = image.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    let name = if relative.as_os_str().is_empty() {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string())
    } else {
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    };
    let title = name.rsplit('/').next().unwrap_or(&name).to_string();
    (format!("{}:{name}", ProviderKind::Local.prefix()), title)
}

impl Catalog for LocalCatalog {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn query(&mut self) -> Result<Vec<ImageRef>, SourceError> {
        let refs: Vec<ImageRef> = self
            .walk()
            .into_iter()
            .filter(|f| self.settings.allows(&f.album_id))
            .map(|f| ImageRef {
                orientation: read_orientation(&f.path),
                id: f.path.to_string_lossy().into_owned(),
                album_id: Some(f.album_id),
            })
            .collect();
        debug!(count = refs.len(), "local query");
        Ok(refs)
    }

    fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>, SourceError> {
        let file = File::open(&image.id).map_err(|e| SourceError::Open {
            id: image.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(file))
    }

    fn list_albums(&self) -> Result<Vec<AlbumData>, SourceError> {
        let mut albums: BTreeMap<String, AlbumData> = BTreeMap::new();
        for found in self.walk() {
            let album = albums
                .entry(found.album_id.clone())
                .or_insert_with(|| AlbumData {
                    id: found.album_id.clone(),
                    title: found.title.clone(),
                    thumbnail_url: Some(format!("file://{}", found.path.display())),
                    updated: 0,
                });
            album.updated = album.updated.max(found.modified);
        }
        Ok(albums.into_values().collect())
    }
}
