//! Stamps the layout header onto a rendered message image.
use image::{Rgb, RgbaImage};
use tracing::info;

use super::StegoError;
use super::header::{self, HeaderFields};

/// How a message image is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions
{
    /// Side of one glyph cell in pixels.
    pub cell_size: u32,
    /// Whether the text reads top to bottom.
    pub vertical: bool,
    /// Colour the stripes are derived from; the top-left pixel when unset.
    pub background: Option<Rgb<u8>>,
}

/// Writes the striped header over the top band of `image`.
///
/// The column count is derived from the image width. All validation happens
/// before the first pixel is written, so on error `image` is unchanged.
///
/// # Errors
///
/// Returns [`StegoError::EmptyImage`] for an image without pixels,
/// [`StegoError::InvalidCellSize`] or [`StegoError::ColumnOverflow`] when the
/// layout cannot be recorded, and [`StegoError::CanvasTooLarge`] when the
/// header strip cannot be built for this width.
pub fn embed_header(
    image: &mut RgbaImage,
    options: &EncodeOptions,
) -> Result<HeaderFields, StegoError>
{
    if image.width() == 0 || image.height() == 0
    {
        return Err(StegoError::EmptyImage);
    }

    let fields = HeaderFields::for_body(
        image.width(),
        options.cell_size,
        options.vertical,
    )?;
    let background = options.background.unwrap_or_else(|| {
        let [red, green, blue, _] = image.get_pixel(0, 0).0;
        Rgb([red, green, blue])
    });
    let strip = header::encode(fields, image.width(), background)?;

    strip.composite_onto(image);
    info!(
        vertical = fields.vertical,
        cell_size = fields.cell_size,
        columns = fields.column_count,
        "embedded header"
    );

    Ok(fields)
}
