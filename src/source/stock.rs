//! Built-in stock photos.
//!
//! Procedural two-color gradients, encoded to PNG on demand, so the table
//! always has something to show when no other provider yields a candidate.

use super::{AlbumData, Catalog, ImageRef, ProviderKind, SourceError};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::io::{Cursor, Read};

pub const STOCK_ALBUM: &str = "stock:default";

/// Color pairs for the gradients, top-left to bottom-right.
const PALETTE: &[([u8; 3], [u8; 3])] = &[
    ([244, 162, 97], [38, 70, 83]),
    ([233, 196, 106], [42, 157, 143]),
    ([231, 111, 81], [38, 70, 83]),
    ([131, 56, 236], [58, 134, 255]),
    ([255, 0, 110], [251, 86, 7]),
    ([6, 214, 160], [17, 138, 178]),
    ([239, 71, 111], [255, 209, 102]),
    ([7, 59, 76], [17, 138, 178]),
    ([92, 148, 13], [249, 219, 109]),
    ([188, 71, 73], [242, 232, 207]),
    ([106, 153, 78], [56, 102, 65]),
    ([167, 201, 87], [242, 232, 207]),
];

pub struct StockCatalog {
    count: usize,
    width: u32,
    height: u32,
}

impl StockCatalog {
    pub fn new(count: usize, width: u32, height: u32) -> Self {
        Self {
            count,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Render stock image `index` at the catalog's size.
    ///
    /// Even indices are landscape, odd ones portrait.
    pub fn render(&self, index: usize) -> RgbaImage {
        let (from, to) = PALETTE[index % PALETTE.len()];
        let (w, h) = if index % 2 == 0 {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        let span = (w + h).saturating_sub(2).max(1) as f32;
        RgbaImage::from_fn(w, h, |x, y| {
            let t = (x + y) as f32 / span;
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            Rgba([
                mix(from[0], to[0]),
                mix(from[1], to[1]),
                mix(from[2], to[2]),
                255,
            ])
        })
    }

    fn parse_index(&self, image: &ImageRef) -> Option<usize> {
        let index: usize = image
            .id
            .strip_prefix(ProviderKind::Stock.prefix())?
            .strip_prefix(':')?
            .parse()
            .ok()?;
        (index < self.count).then_some(index)
    }
}

impl Default for StockCatalog {
    fn default() -> Self {
        Self::new(PALETTE.len(), 640, 480)
    }
}

impl Catalog for StockCatalog {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stock
    }

    fn query(&mut self) -> Result<Vec<ImageRef>, SourceError> {
        Ok((0..self.count)
            .map(|i| ImageRef {
                album_id: Some(STOCK_ALBUM.to_string()),
                ..ImageRef::new(format!("{}:{i}", ProviderKind::Stock.prefix()))
            })
            .collect())
    }

    fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>, SourceError> {
        let index = self.parse_index(image).ok_or_else(|| SourceError::Open {
            id: image.id.clone(),
            reason: "no such stock image".to_string(),
        })?;
        let pixels = self.render(index);
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn list_albums(&self) -> Result<Vec<AlbumData>, SourceError> {
        Ok(vec![AlbumData {
            id: STOCK_ALBUM.to_string(),
            title: "Stock photos".to_string(),
            thumbnail_url: None,
            updated: 0,
        }])
    }
}
