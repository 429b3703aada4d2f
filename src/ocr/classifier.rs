//! Hand-off point for an external glyph classifier.
//!
//! Instead of matching fingerprints, segmented glyphs can be labelled by a
//! trained model. The crate does not ship one; it only prepares the samples
//! such a model expects and maps its answers back onto the glyphs.
use std::error::Error;

use image::imageops::{self, FilterType};
use image::{GenericImageView, GrayImage, Pixel};
use tracing::debug;

use super::{OcrError, RecognizedGlyph};
use crate::analysis::segment::locate_glyphs;
use crate::analysis::{Rect, region};
use crate::config::OcrConfig;

/// A square glyph sample with luma scaled to `0.0..=1.0`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSample
{
    pub side: u32,
    pub data: Vec<f32>,
}

/// Labels glyph samples.
pub trait GlyphClassifier
{
    type Error: Error + Send + Sync + 'static;

    /// Returns one label index per sample, in sample order.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn classify(
        &mut self,
        samples: &[GlyphSample],
    ) -> Result<Vec<usize>, Self::Error>;
}

/// Resamples every glyph of a binarised `mask` to a `side` square.
///
/// # Panics
///
/// Panics when a rectangle lies outside `mask`.
#[must_use]
pub fn glyph_samples(
    mask: &GrayImage,
    glyphs: &[Rect],
    side: u32,
) -> Vec<GlyphSample>
{
    glyphs
        .iter()
        .map(|&rect| {
            let resized = imageops::resize(
                &*region(mask, rect),
                side,
                side,
                FilterType::Triangle,
            );
            GlyphSample {
                side,
                data: resized
                    .pixels()
                    .map(|pixel| f32::from(pixel.0[0]) / f32::from(u8::MAX))
                    .collect(),
            }
        })
        .collect()
}

/// Segments `image` and lets `classifier` label every glyph.
///
/// Label index *i* names the glyph with the *i*-th character of the
/// configured charset. Classifier output carries no distance.
///
/// # Errors
///
/// Returns [`OcrError::NoGlyphs`] when nothing could be segmented,
/// [`OcrError::Classifier`] when the classifier fails, and
/// [`OcrError::LabelCount`] or [`OcrError::UnknownLabel`] when its answer
/// does not fit the samples or the charset.
pub fn recognize_with_classifier<I, C>(
    image: &I,
    classifier: &mut C,
    config: &OcrConfig,
) -> Result<Vec<RecognizedGlyph>, OcrError>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
    C: GlyphClassifier,
{
    let layout = locate_glyphs(image);
    if layout.glyphs.is_empty()
    {
        return Err(OcrError::NoGlyphs);
    }

    let samples =
        glyph_samples(&layout.mask, &layout.glyphs, config.sample_side);
    let labels = classifier
        .classify(&samples)
        .map_err(|source| OcrError::Classifier(Box::new(source)))?;
    if labels.len() != samples.len()
    {
        return Err(OcrError::LabelCount {
            expected: samples.len(),
            actual: labels.len(),
        });
    }
    debug!(glyphs = labels.len(), "classifier labelled glyphs");

    let names: Vec<char> = config.charset.chars().collect();
    layout
        .glyphs
        .iter()
        .zip(labels)
        .map(|(&rect, label)| {
            let symbol = names.get(label).copied().ok_or(
                OcrError::UnknownLabel {
                    label,
                    labels: names.len(),
                },
            )?;
            Ok(RecognizedGlyph {
                rect,
                symbol: Some(symbol),
                distance: None,
            })
        })
        .collect()
}
