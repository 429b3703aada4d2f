//! Binary fingerprints of pixel regions.
//!
//! A region is resampled to a small `resolution x resolution` square, reduced
//! to luma and thresholded with the corner polarity rule, giving a
//! `resolution²` bit [`Hash`]. Hashes of visually similar regions differ in
//! few bits, which is what the Hamming-distance matcher relies on.
use std::fmt;

use image::imageops::{self, FilterType};
use image::{GenericImageView, Pixel};

use super::binarize::{BitMask, ThresholdMode, binarize_bits, to_gray};

/// Fixed-length bit vector summarising a resampled region.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Hash(BitMask);

impl Hash
{
    /// Number of bits in the hash.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }

    /// A hash whose entries all equal the first one carries no shape, it
    /// stems from a blank cell or chunk.
    #[must_use]
    pub fn is_degenerate(&self) -> bool
    {
        self.0.all() || self.0.not_any()
    }

    /// Number of positions where the two hashes differ, or `None` when the
    /// lengths disagree and the hashes are not comparable.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> Option<u32>
    {
        if self.len() != other.len()
        {
            return None;
        }

        let differing = self.0.clone() ^ other.0.as_bitslice();
        u32::try_from(differing.count_ones()).ok()
    }
}

impl FromIterator<bool> for Hash
{
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self
    {
        Self(iter.into_iter().collect())
    }
}

// Render as a compact 0/1 string, the raw BitVec debug output is noisy
impl fmt::Debug for Hash
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str("Hash(")?;
        for bit in self.0.iter().by_vals()
        {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str(")")
    }
}

/// Fingerprints `region` at `resolution x resolution`.
///
/// The region is resampled with a triangle (bilinear) filter, which is
/// deterministic for identical input, then binarised with `mode`.
///
/// # Panics
///
/// Panics when `region` or `resolution` is empty.
pub fn fingerprint<I>(region: &I, resolution: u32, mode: ThresholdMode) -> Hash
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8> + 'static,
{
    assert!(resolution > 0, "fingerprint resolution must be positive");
    assert!(
        region.width() > 0 && region.height() > 0,
        "cannot fingerprint an empty region"
    );

    let resampled =
        imageops::resize(region, resolution, resolution, FilterType::Triangle);
    Hash(binarize_bits(&to_gray(&resampled), mode))
}
