//! Pixel analysis primitives shared by both reading modes.
//!
//! Everything here works on read-only [`image::RgbaImage`] buffers (the
//! "pixel buffer" handed over by the image loader) or on grayscale buffers
//! derived from them:
//!
//! - [`binarize`]: luma conversion plus mean / Otsu thresholding
//! - [`fingerprint`]: downsampled binary hashes of a region
//! - [`segment`]: projection-profile glyph segmentation
use image::{GenericImageView, SubImage};

pub mod binarize;
pub mod fingerprint;
pub mod segment;

pub use binarize::{ThresholdMode, binarize_bits, luma, threshold, to_gray};
pub use fingerprint::{Hash, fingerprint};
pub use segment::{GlyphChunk, segment};

/// An axis aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect
{
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect
{
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self
    {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> u32
    {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> u32
    {
        self.y + self.height
    }
}

/// Borrows `rect` out of `image`.
///
/// # Panics
///
/// Panics when `rect` does not lie fully inside `image`. Callers derive their
/// rectangles from the image dimensions, so a violation is a logic error and
/// must not be clamped away.
pub fn region<I>(image: &I, rect: Rect) -> SubImage<&I>
where
    I: GenericImageView,
{
    assert!(
        u64::from(rect.x) + u64::from(rect.width) <= u64::from(image.width())
            && u64::from(rect.y) + u64::from(rect.height)
                <= u64::from(image.height()),
        "region {rect:?} exceeds {}x{} buffer",
        image.width(),
        image.height()
    );
    image.view(rect.x, rect.y, rect.width, rect.height)
}
