use super::animation::Animation;
use crate::imaging::DecodedImage;
use crate::placement::{FitMode, Transform};
use serde::Serialize;
use std::fmt;

/// Identifies one placement, from its load slot until the bitmap is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Slot reserved, image not yet supplied. Not visible.
    Loading,
    Placed,
    Selected,
    /// Animating back onto the table; settles to `Placed`.
    Dropping,
    /// Fading to transparent; removed when the fade ends.
    FadingOut,
}

/// An image on the table.
///
/// Owns its bitmap exclusively. The table drops the item (and with it the
/// pixel buffer) exactly once, when the item is removed.
#[derive(Debug)]
pub struct PlacedItem {
    pub(crate) id: ItemId,
    pub(crate) image: DecodedImage,
    pub(crate) transform: Transform,
    pub(crate) state: ItemState,
    pub(crate) order_key: u64,
    pub(crate) z: u64,
    pub(crate) fit: FitMode,
    pub(crate) animation: Option<Animation>,
}

impl PlacedItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub(crate) fn size(&self) -> (f64, f64) {
        (self.width() as f64, self.height() as f64)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Eviction order; the smallest key among non-selected items goes first.
    pub fn order_key(&self) -> u64 {
        self.order_key
    }

    /// Stacking order, larger is on top.
    pub fn z(&self) -> u64 {
        self.z
    }

    pub fn fit(&self) -> FitMode {
        self.fit
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }
}
