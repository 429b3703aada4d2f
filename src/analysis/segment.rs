//! Glyph segmentation from projection profiles.
//!
//! The image is binarised with Otsu's threshold, then foreground pixels are
//! counted per row and per column. Runs of non-empty rows give text lines,
//! runs of non-empty columns inside a line give glyphs. Runs shorter than the
//! dominant glyph extent are stitched to their neighbours so glyphs made of
//! several strokes (dotted letters, quotes) stay in one piece.
use image::{GenericImageView, GrayImage, Pixel};
use tracing::debug;

use super::binarize::{FOREGROUND, ThresholdMode, binarize_mask, to_gray};
use super::fingerprint::{Hash, fingerprint};
use super::{Rect, region};

/// Squared distance from the glyph extent under which an accumulated run is
/// considered complete.
const MERGE_TOLERANCE_SQUARED: u64 = 4;

/// Class of a run in a projection profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind
{
    Foreground,
    Background,
}

/// A maximal run of one class in a projection profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range
{
    pub kind: RangeKind,
    pub length: u32,
}

impl Range
{
    #[must_use]
    pub const fn foreground(length: u32) -> Self
    {
        Self {
            kind: RangeKind::Foreground,
            length,
        }
    }

    #[must_use]
    pub const fn background(length: u32) -> Self
    {
        Self {
            kind: RangeKind::Background,
            length,
        }
    }

    #[must_use]
    pub fn is_foreground(&self) -> bool
    {
        self.kind == RangeKind::Foreground
    }
}

/// A foreground span along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band
{
    pub offset: u32,
    pub size: u32,
}

/// A segmented glyph and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphChunk
{
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub hash: Hash,
}

impl GlyphChunk
{
    #[must_use]
    pub const fn rect(&self) -> Rect
    {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Foreground pixel count of every row of a binarised mask.
#[must_use]
pub fn row_profile(mask: &GrayImage) -> Vec<u32>
{
    mask.rows()
        .map(|row| {
            let count = row.filter(|pixel| pixel.0[0] == FOREGROUND).count();
            u32::try_from(count).unwrap_or(u32::MAX)
        })
        .collect()
}

/// Foreground pixel count of every column, restricted to the rows of `band`.
#[must_use]
pub fn column_profile(mask: &GrayImage, band: Band) -> Vec<u32>
{
    let rows = band.offset..band.offset + band.size;
    (0..mask.width())
        .map(|x| {
            let count = rows
                .clone()
                .filter(|&y| mask.get_pixel(x, y).0[0] == FOREGROUND)
                .count();
            u32::try_from(count).unwrap_or(u32::MAX)
        })
        .collect()
}

/// Run-length encodes a profile into alternating foreground and background
/// ranges.
#[must_use]
pub fn count_ranges(profile: &[u32]) -> Vec<Range>
{
    let mut ranges = Vec::new();
    let mut foreground = 0;
    let mut background = 0;

    for &count in profile
    {
        if count > 0
        {
            foreground += 1;
            if background > 0
            {
                ranges.push(Range::background(background));
                background = 0;
            }
        }
        else
        {
            background += 1;
            if foreground > 0
            {
                ranges.push(Range::foreground(foreground));
                foreground = 0;
            }
        }
    }

    if foreground > 0
    {
        ranges.push(Range::foreground(foreground));
    }
    if background > 0
    {
        ranges.push(Range::background(background));
    }

    ranges
}

/// Longest foreground run, zero when there is none.
#[must_use]
pub fn longest_foreground(ranges: &[Range]) -> u32
{
    ranges
        .iter()
        .filter(|range| range.is_foreground())
        .map(|range| range.length)
        .max()
        .unwrap_or(0)
}

/// Stitches foreground runs shorter than `font_size` to the ranges that
/// follow them.
///
/// Accumulation stops as soon as the total reaches `font_size` or comes
/// within the tolerance band below it; the accumulated span is emitted as
/// one foreground range. An accumulation still open at the end of the
/// profile is emitted as is.
#[must_use]
pub fn merge_ranges(ranges: &[Range], font_size: u32) -> Vec<Range>
{
    let mut merged = Vec::with_capacity(ranges.len());
    let mut pending: Option<u32> = None;

    for range in ranges
    {
        if let Some(total) = pending.as_mut()
        {
            *total += range.length;
            let distance = u64::from(total.abs_diff(font_size));
            if *total >= font_size
                || distance * distance < MERGE_TOLERANCE_SQUARED
            {
                merged.push(Range::foreground(*total));
                pending = None;
            }
            continue;
        }

        if range.is_foreground() && range.length < font_size
        {
            pending = Some(range.length);
            continue;
        }

        merged.push(*range);
    }

    if let Some(total) = pending
    {
        merged.push(Range::foreground(total));
    }

    merged
}

/// Converts ranges into the offsets and sizes of their foreground runs.
#[must_use]
pub fn create_chunks(ranges: &[Range]) -> Vec<Band>
{
    let mut bands = Vec::new();
    let mut offset = 0;
    for range in ranges
    {
        if range.is_foreground()
        {
            bands.push(Band {
                offset,
                size: range.length,
            });
        }
        offset += range.length;
    }
    bands
}

/// Binarised image plus the glyph rectangles found in it, in reading order
/// (row bands top to bottom, glyphs left to right within a band).
#[derive(Debug, Clone)]
pub struct GlyphLayout
{
    pub mask: GrayImage,
    pub font_size: u32,
    pub glyphs: Vec<Rect>,
}

/// Finds glyph rectangles without fingerprinting them.
pub fn locate_glyphs<I>(image: &I) -> GlyphLayout
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let mask = binarize_mask(&to_gray(image), ThresholdMode::Otsu);

    let row_ranges = count_ranges(&row_profile(&mask));
    let column_ranges = count_ranges(&column_profile(
        &mask,
        Band {
            offset: 0,
            size: mask.height(),
        },
    ));
    let font_size =
        longest_foreground(&row_ranges).max(longest_foreground(&column_ranges));

    let mut glyphs = Vec::new();
    for row in create_chunks(&merge_ranges(&row_ranges, font_size))
    {
        let ranges = count_ranges(&column_profile(&mask, row));
        glyphs.extend(
            create_chunks(&merge_ranges(&ranges, font_size))
                .into_iter()
                .map(|column| {
                    Rect::new(column.offset, row.offset, column.size, row.size)
                }),
        );
    }

    debug!(font_size, glyphs = glyphs.len(), "segmented glyphs");

    GlyphLayout {
        mask,
        font_size,
        glyphs,
    }
}

/// Segments `image` into glyph chunks fingerprinted at `resolution`.
pub fn segment<I>(
    image: &I,
    resolution: u32,
    mode: ThresholdMode,
) -> Vec<GlyphChunk>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let layout = locate_glyphs(image);
    layout
        .glyphs
        .iter()
        .map(|&rect| GlyphChunk {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            hash: fingerprint(
                &*region(&layout.mask, rect),
                resolution,
                mode,
            ),
        })
        .collect()
}
