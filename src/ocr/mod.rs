//! Reads rendered text without a grid.
//!
//! Glyphs are located with projection-profile segmentation in both the
//! target image and a reference glyph map. The *i*-th glyph of the map, in
//! reading order, is named by the *i*-th character of the charset, and every
//! target glyph takes the name of its nearest map glyph.
//!
//! # Errors
//!
//! Returns [`OcrError`] when the map yields no alphabet or the target yields
//! no glyphs at all.
use image::{GenericImageView, Pixel};
use thiserror::Error;
use tracing::info;

use crate::analysis::{Rect, segment};
use crate::config::OcrConfig;
use crate::symbols::{Alphabet, SymbolError};

mod classifier;

pub use classifier::{
    GlyphClassifier, GlyphSample, glyph_samples, recognize_with_classifier,
};

/// Errors that can be emitted while reading segmented text
#[derive(Debug, Error)]
pub enum OcrError
{
    /// Segmentation found nothing to read in the target image
    #[error("no glyphs could be segmented from the image")]
    NoGlyphs,

    /// The glyph map yielded no usable alphabet
    #[error("invalid glyph map: {0}")]
    Alphabet(#[from] SymbolError),

    /// The external classifier failed
    #[error("glyph classifier failed: {0}")]
    Classifier(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The classifier returned a different number of labels than samples
    #[error("classifier returned {actual} labels for {expected} glyphs")]
    LabelCount
    {
        expected: usize, actual: usize
    },

    /// The classifier returned a label without a character
    #[error("classifier label {label} is outside the {labels} known labels")]
    UnknownLabel
    {
        label: usize, labels: usize
    },
}

/// A target glyph and what it was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizedGlyph
{
    pub rect: Rect,
    /// `None` for blank glyphs and rejected matches.
    pub symbol: Option<char>,
    /// Hamming distance to the chosen map glyph, when one was chosen.
    pub distance: Option<u32>,
}

/// Builds the alphabet from the glyphs of `map`, in reading order.
///
/// # Errors
///
/// Returns [`OcrError::Alphabet`] when the map has no glyphs or the charset
/// is empty.
pub fn build_glyph_alphabet<I>(
    map: &I,
    config: &OcrConfig,
) -> Result<Alphabet, OcrError>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let chunks = segment(map, config.fingerprint_resolution, config.threshold);
    let alphabet = Alphabet::from_hashes(
        &config.charset,
        chunks.into_iter().map(|chunk| chunk.hash),
    )?;
    info!(symbols = alphabet.len(), "built glyph alphabet");
    Ok(alphabet)
}

/// Segments `image` and matches every glyph against the glyphs of `map`.
///
/// # Errors
///
/// Returns [`OcrError::Alphabet`] for an unusable map and
/// [`OcrError::NoGlyphs`] when `image` contains no foreground.
pub fn recognize<I, M>(
    image: &I,
    map: &M,
    config: &OcrConfig,
) -> Result<Vec<RecognizedGlyph>, OcrError>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
    M: GenericImageView,
    M::Pixel: Pixel<Subpixel = u8>,
{
    let alphabet = build_glyph_alphabet(map, config)?;
    let chunks =
        segment(image, config.fingerprint_resolution, config.threshold);
    if chunks.is_empty()
    {
        return Err(OcrError::NoGlyphs);
    }

    let acceptance = config.acceptance();
    let glyphs: Vec<RecognizedGlyph> = chunks
        .iter()
        .map(|chunk| {
            let found = alphabet.classify(&chunk.hash, acceptance);
            RecognizedGlyph {
                rect: chunk.rect(),
                symbol: found.map(|found| found.name),
                distance: found.map(|found| found.distance),
            }
        })
        .collect();

    let matched = glyphs.iter().filter(|glyph| glyph.symbol.is_some()).count();
    info!(glyphs = glyphs.len(), matched, "recognised glyphs");

    Ok(glyphs)
}

/// Lays recognised glyphs out as text.
///
/// Glyphs sharing a row band form one line. Inside a line a space is
/// inserted wherever the gap to the previous glyph is at least that glyph's
/// width; blank glyphs render as spaces. Every line ends with a newline.
#[must_use]
pub fn render_lines(glyphs: &[RecognizedGlyph]) -> String
{
    let mut text = String::with_capacity(glyphs.len() * 2);
    let mut previous: Option<&RecognizedGlyph> = None;

    for glyph in glyphs
    {
        match previous
        {
            Some(last) if last.rect.y == glyph.rect.y =>
            {
                let gap = glyph.rect.x.saturating_sub(last.rect.right());
                if gap >= last.rect.width
                {
                    text.push(' ');
                }
            },
            Some(_) => text.push('\n'),
            None => {},
        }
        text.push(glyph.symbol.unwrap_or(' '));
        previous = Some(glyph);
    }

    if previous.is_some()
    {
        text.push('\n');
    }
    text
}

/// Reads the text of `image` using the glyphs of `map`.
///
/// # Errors
///
/// See [`recognize`].
pub fn read_text<I, M>(
    image: &I,
    map: &M,
    config: &OcrConfig,
) -> Result<String, OcrError>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
    M: GenericImageView,
    M::Pixel: Pixel<Subpixel = u8>,
{
    recognize(image, map, config).map(|glyphs| render_lines(&glyphs))
}
