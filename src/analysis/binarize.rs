//! Two-level classification of pixel regions.
//!
//! Every region is first reduced to an 8-bit luma buffer
//! (`floor(0.299 R + 0.587 G + 0.114 B)`), then split at a threshold chosen
//! either as the rounded mean luma or with Otsu's method.
//!
//! # Polarity
//!
//! The absolute brightness of a pixel does not decide its class. The top-left
//! pixel is taken as background and every pixel on the other side of the
//! threshold is foreground, so light-on-dark and dark-on-light artwork yield
//! the same mask.
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use image::{GenericImageView, GrayImage, Luma, Pixel};
use serde::{Deserialize, Serialize};

/// Packed one-bit-per-pixel mask in row-major order.
pub type BitMask = BitVec<u64, Lsb0>;

/// Value written for background pixels by [`binarize_mask`].
pub const BACKGROUND: u8 = 0;
/// Value written for foreground pixels by [`binarize_mask`].
pub const FOREGROUND: u8 = u8::MAX;

/// How the luma threshold is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode
{
    /// Rounded arithmetic mean of all luma values.
    #[default]
    Mean,
    /// Threshold maximising the between-class variance.
    Otsu,
}

/// Integer luma of an RGB triple, floored.
#[must_use]
pub fn luma(red: u8, green: u8, blue: u8) -> u8
{
    let weighted = 299 * u32::from(red)
        + 587 * u32::from(green)
        + 114 * u32::from(blue);
    // the weights sum to 1000, so the quotient never exceeds 255
    u8::try_from(weighted / 1000).unwrap_or(u8::MAX)
}

/// Materialises the luma buffer of `image`.
pub fn to_gray<I>(image: &I) -> GrayImage
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [red, green, blue, _] = image.get_pixel(x, y).to_rgba().0;
        Luma([luma(red, green, blue)])
    })
}

/// Computes the threshold of `gray` with the requested `mode`.
#[must_use]
pub fn threshold(gray: &GrayImage, mode: ThresholdMode) -> u8
{
    match mode
    {
        ThresholdMode::Mean => mean_threshold(gray.as_raw()),
        ThresholdMode::Otsu => otsu_threshold(gray.as_raw()),
    }
}

fn mean_threshold(samples: &[u8]) -> u8
{
    if samples.is_empty()
    {
        return 0;
    }

    let sum: u64 = samples.iter().copied().map(u64::from).sum();
    let count = samples.len() as u64;
    // round half up
    u8::try_from((2 * sum + count) / (2 * count)).unwrap_or(u8::MAX)
}

fn otsu_threshold(samples: &[u8]) -> u8
{
    let mut histogram = [0_u64; 256];
    for &sample in samples
    {
        histogram[usize::from(sample)] += 1;
    }

    let total = samples.len() as u64;
    let weighted_sum: f64 = histogram
        .iter()
        .zip(0_u8..=u8::MAX)
        .map(|(&count, level)| f64::from(level) * count as f64)
        .sum();

    let mut weight_below = 0_u64;
    let mut sum_below = 0.0_f64;
    let mut best_variance = 0.0_f64;
    let mut best = 0_u8;

    for (&count, level) in histogram.iter().zip(0_u8..=u8::MAX)
    {
        weight_below += count;
        if weight_below == 0
        {
            continue;
        }
        let weight_above = total - weight_below;
        if weight_above == 0
        {
            break;
        }

        sum_below += f64::from(level) * count as f64;
        let mean_below = sum_below / weight_below as f64;
        let mean_above = (weighted_sum - sum_below) / weight_above as f64;
        let variance = weight_below as f64
            * weight_above as f64
            * (mean_below - mean_above).powi(2);

        // strict comparison keeps the lowest level on ties
        if variance > best_variance
        {
            best_variance = variance;
            best = level;
        }
    }

    best
}

/// Whether `value` falls on the other side of `threshold` than `corner`.
#[inline]
fn is_foreground(value: u8, corner: u8, threshold: u8) -> bool
{
    (value > threshold) != (corner > threshold)
}

/// Packs `gray` into one bit per pixel, `1` marking foreground.
#[must_use]
pub fn binarize_bits(gray: &GrayImage, mode: ThresholdMode) -> BitMask
{
    let samples = gray.as_raw();
    let Some(&corner) = samples.first()
    else
    {
        return BitMask::new();
    };

    let threshold = threshold(gray, mode);
    samples
        .iter()
        .map(|&value| is_foreground(value, corner, threshold))
        .collect()
}

/// Replaces every pixel of `gray` with [`BACKGROUND`] or [`FOREGROUND`].
#[must_use]
pub fn binarize_mask(gray: &GrayImage, mode: ThresholdMode) -> GrayImage
{
    let Some(&corner) = gray.as_raw().first()
    else
    {
        return gray.clone();
    };

    let threshold = threshold(gray, mode);
    let mut mask = gray.clone();
    for pixel in mask.pixels_mut()
    {
        pixel.0[0] = if is_foreground(pixel.0[0], corner, threshold)
        {
            FOREGROUND
        }
        else
        {
            BACKGROUND
        };
    }
    mask
}
