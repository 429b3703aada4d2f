//! Layout metadata stored as colour stripes in the top band of an image.
//!
//! # Format
//!
//! - 24 bits, one per vertical stripe, most significant bit on the left
//! - byte 0: vertical flag (0 or 1)
//! - byte 1: cell size in pixels
//! - byte 2: number of cell columns
//! - a `1` stripe is painted with the background colour shifted by 2 per
//!   channel, a `0` stripe leaves the background untouched
//!
//! The leftmost stripe belongs to the high bits of the vertical flag byte and
//! is therefore always `0`; the decoder compares every stripe against it.
use image::{GenericImageView, Rgb, Rgba, RgbaImage};

use super::StegoError;

/// Number of stripes (and bits) in the header.
pub const STRIPE_COUNT: u32 = 24;
/// Row sampled by the decoder, counted from the top of the band.
const SAMPLE_ROW: u32 = 2;
/// Smallest band height that still contains the sample row.
pub const MIN_BAND_HEIGHT: u32 = SAMPLE_ROW + 1;
/// Per-channel shift marking a `1` stripe.
const COLOR_OFFSET: u8 = 2;

/// Values carried by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderFields
{
    pub vertical: bool,
    pub cell_size: u8,
    pub column_count: u8,
}

impl HeaderFields
{
    /// Derives the column count for a body `width` pixels wide.
    ///
    /// # Errors
    ///
    /// Returns [`StegoError::InvalidCellSize`] when `cell_size` is zero or
    /// does not fit a byte, [`StegoError::ColumnOverflow`] when more than 255
    /// columns fit the width.
    pub fn for_body(
        width: u32,
        cell_size: u32,
        vertical: bool,
    ) -> Result<Self, StegoError>
    {
        let size = u8::try_from(cell_size)
            .ok()
            .filter(|&size| size > 0)
            .ok_or(StegoError::InvalidCellSize { cell_size })?;

        let columns = width / cell_size;
        let column_count = u8::try_from(columns)
            .map_err(|_| StegoError::ColumnOverflow { columns })?;

        Ok(Self {
            vertical,
            cell_size: size,
            column_count,
        })
    }

    /// Packs the fields into the low 24 bits.
    #[must_use]
    pub fn to_bits(self) -> u32
    {
        (u32::from(self.vertical) << 16)
            | (u32::from(self.cell_size) << 8)
            | u32::from(self.column_count)
    }

    /// Unpacks the low 24 bits. Any non-zero flag byte reads as vertical.
    #[must_use]
    pub fn from_bits(bits: u32) -> Self
    {
        let [_, flag, cell_size, column_count] = bits.to_be_bytes();
        Self {
            vertical: flag != 0,
            cell_size,
            column_count,
        }
    }
}

/// Greatest common divisor, iterative Euclid.
#[must_use]
pub fn gcd(mut a: u64, mut b: u64) -> u64
{
    while b != 0
    {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple, zero when either side is zero.
#[must_use]
pub fn lcm(a: u64, b: u64) -> u64
{
    if a == 0 || b == 0
    {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Colour used for `1` stripes: every channel moves by +2, or by -2 when
/// the shift would reach 255.
#[must_use]
pub fn stripe_color(background: Rgb<u8>) -> Rgb<u8>
{
    Rgb(background.0.map(|channel| {
        channel
            .checked_add(COLOR_OFFSET)
            .filter(|&shifted| shifted < u8::MAX)
            .unwrap_or_else(|| channel - COLOR_OFFSET)
    }))
}

/// The header strip at its native resolution.
///
/// The width is `lcm(body_width, 24)` so every stripe spans a whole number
/// of pixels; the strip is scaled down to the body width when composited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeImage
{
    width: u32,
    height: u32,
    bits: u32,
    color: Rgb<u8>,
}

impl StripeImage
{
    #[must_use]
    pub fn width(&self) -> u32
    {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32
    {
        self.height
    }

    #[must_use]
    pub fn stripe_width(&self) -> u32
    {
        self.width / STRIPE_COUNT
    }

    /// Whether `stripe` carries a `1`.
    #[must_use]
    pub fn is_painted(&self, stripe: u32) -> bool
    {
        stripe < STRIPE_COUNT
            && (self.bits >> (STRIPE_COUNT - 1 - stripe)) & 1 == 1
    }

    /// Scales the strip to the width of `base` and paints it over the top
    /// band. Unpainted stripes leave `base` untouched.
    pub fn composite_onto(&self, base: &mut RgbaImage)
    {
        let base_width = u64::from(base.width());
        let native_width = u64::from(self.width);
        let band = u64::from(self.height) * base_width / native_width;
        let band = u32::try_from(band).unwrap_or(u32::MAX).min(base.height());

        let stripe_width = u64::from(self.stripe_width());
        let [red, green, blue] = self.color.0;
        let paint = Rgba([red, green, blue, u8::MAX]);

        for x in 0..base.width()
        {
            // nearest native column to the centre of the base pixel
            let native_x =
                (2 * u64::from(x) + 1) * native_width / (2 * base_width);
            let stripe = u32::try_from(native_x / stripe_width)
                .unwrap_or(STRIPE_COUNT)
                .min(STRIPE_COUNT - 1);

            if self.is_painted(stripe)
            {
                for y in 0..band
                {
                    base.put_pixel(x, y, paint);
                }
            }
        }
    }
}

/// Builds the header strip for a body `body_width` pixels wide.
///
/// The band is `cell_size` body pixels tall (at least [`MIN_BAND_HEIGHT`]),
/// so it covers the first row of cells.
///
/// # Errors
///
/// Returns [`StegoError::EmptyImage`] for a zero width,
/// [`StegoError::InvalidCellSize`] for a zero cell size and
/// [`StegoError::CanvasTooLarge`] when the native strip would not fit `u32`
/// dimensions.
pub fn encode(
    fields: HeaderFields,
    body_width: u32,
    background: Rgb<u8>,
) -> Result<StripeImage, StegoError>
{
    if body_width == 0
    {
        return Err(StegoError::EmptyImage);
    }
    if fields.cell_size == 0
    {
        return Err(StegoError::InvalidCellSize { cell_size: 0 });
    }

    let native_width = lcm(u64::from(body_width), u64::from(STRIPE_COUNT));
    let scale = native_width / u64::from(body_width);
    let band = u64::from(fields.cell_size).max(u64::from(MIN_BAND_HEIGHT));

    let too_large = || StegoError::CanvasTooLarge {
        width: native_width,
    };
    let width = u32::try_from(native_width).map_err(|_| too_large())?;
    let height = u32::try_from(scale * band).map_err(|_| too_large())?;

    Ok(StripeImage {
        width,
        height,
        bits: fields.to_bits(),
        color: stripe_color(background),
    })
}

/// A decoded header plus the layout scaled to the decoding canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHeader
{
    pub fields: HeaderFields,
    /// Cell size in canvas pixels.
    pub cell_size: u32,
    /// Width of all cell columns together, in canvas pixels.
    pub grid_width: u32,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(value: u32, ratio: f64) -> u32
{
    (f64::from(value) * ratio).round() as u32
}

/// Column closest to the centre of `stripe` when the 24 stripes are spread
/// over `body_width` pixels.
fn stripe_center(stripe: u32, body_width: u32) -> u32
{
    let center = (2 * u64::from(stripe) + 1) * u64::from(body_width)
        / (2 * u64::from(STRIPE_COUNT));
    u32::try_from(center).unwrap_or(body_width - 1)
}

/// Reads the header from the top band of `image`.
///
/// `body_width` is the width the stripes were spread over (normally the
/// image width) and `scale_ratio` the factor the image was resized by since
/// encoding.
///
/// # Errors
///
/// Returns [`StegoError::HeaderTooSmall`] when the image cannot hold 24
/// stripes of at least one pixel or is too short to reach the sample row.
pub fn decode<I>(
    image: &I,
    body_width: u32,
    scale_ratio: f64,
) -> Result<DecodedHeader, StegoError>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    if body_width < STRIPE_COUNT
        || body_width > image.width()
        || image.height() <= SAMPLE_ROW
    {
        return Err(StegoError::HeaderTooSmall {
            width: image.width(),
            height: image.height(),
        });
    }

    let sums: Vec<u32> = (0..STRIPE_COUNT)
        .map(|stripe| {
            let x = stripe_center(stripe, body_width);
            let [red, green, blue, _] = image.get_pixel(x, SAMPLE_ROW).0;
            u32::from(red) + u32::from(green) + u32::from(blue)
        })
        .collect();

    let reference = sums[0];
    let bits = sums
        .iter()
        .fold(0_u32, |bits, &sum| (bits << 1) | u32::from(sum != reference));
    let fields = HeaderFields::from_bits(bits);

    let cell_size = u32::from(fields.cell_size);
    Ok(DecodedHeader {
        fields,
        cell_size: scaled(cell_size, scale_ratio),
        grid_width: scaled(
            cell_size * u32::from(fields.column_count),
            scale_ratio,
        ),
    })
}
