//! Reads grid-encoded text back out of an image.
//!
//! Both the target and the reference map pass through the same steps:
//! the canvas is normalised to a width divisible by the stripe count, the
//! header is decoded, and the interior cells are fingerprinted. Map cells
//! become the alphabet the target cells are matched against.
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{debug, info};

use super::StegoError;
use super::grid::{self, CellGrid};
use super::header::{self, DecodedHeader, STRIPE_COUNT, lcm};
use crate::config::GridConfig;
use crate::symbols::{Alphabet, assemble};

/// Header and cell fingerprints read from one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridReading
{
    pub header: DecodedHeader,
    pub grid: CellGrid,
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn canvas_size(width: u32, height: u32, max_area: u64) -> (u64, u64, f64)
{
    let natural_width = f64::from(width);
    let mut canvas_width = lcm(u64::from(width), u64::from(STRIPE_COUNT));
    let mut ratio = canvas_width as f64 / natural_width;
    let mut canvas_height = (ratio * f64::from(height)).round() as u64;

    let area = canvas_width as f64 * canvas_height as f64;
    if area > max_area as f64
    {
        let shrink = max_area as f64 / area;
        canvas_width = (canvas_width as f64 * shrink).floor() as u64;
        canvas_height = (canvas_height as f64 * shrink).floor() as u64;
        ratio = canvas_width as f64 / natural_width;
    }

    (canvas_width, canvas_height.max(1), ratio)
}

/// Resamples `image` to the decoding canvas.
///
/// The canvas is `lcm(width, 24)` wide so every header stripe spans whole
/// pixels, and the height keeps the aspect ratio. When the canvas area
/// exceeds `max_area` both sides shrink by `max_area / area`. Returns the
/// canvas with the ratio between canvas width and image width.
///
/// # Errors
///
/// Returns [`StegoError::EmptyImage`] for an image without pixels and
/// [`StegoError::CanvasTooLarge`] when no usable canvas size exists.
pub fn normalize_canvas(
    image: &RgbaImage,
    max_area: u64,
) -> Result<(RgbaImage, f64), StegoError>
{
    if image.width() == 0 || image.height() == 0
    {
        return Err(StegoError::EmptyImage);
    }

    let (width, height, ratio) =
        canvas_size(image.width(), image.height(), max_area);
    let too_large = || StegoError::CanvasTooLarge { width };
    let canvas_width = u32::try_from(width)
        .ok()
        .filter(|&width| width > 0)
        .ok_or_else(too_large)?;
    let canvas_height = u32::try_from(height).map_err(|_| too_large())?;

    debug!(
        width = canvas_width,
        height = canvas_height,
        ratio,
        "normalised canvas"
    );

    let canvas = if (canvas_width, canvas_height) == image.dimensions()
    {
        image.clone()
    }
    else
    {
        imageops::resize(
            image,
            canvas_width,
            canvas_height,
            FilterType::Triangle,
        )
    };
    Ok((canvas, ratio))
}

/// Decodes the header of `image` and fingerprints its cell grid.
///
/// # Errors
///
/// Propagates canvas, header and grid errors; a header announcing a cell
/// size of zero yields [`StegoError::InvalidCellSize`].
pub fn read_grid(
    image: &RgbaImage,
    config: &GridConfig,
) -> Result<GridReading, StegoError>
{
    let (canvas, ratio) = normalize_canvas(image, config.max_canvas_area)?;
    let header = header::decode(&canvas, canvas.width(), ratio)?;
    info!(
        vertical = header.fields.vertical,
        cell_size = header.cell_size,
        grid_width = header.grid_width,
        "decoded header"
    );

    let resolution = config.fingerprint_resolution;
    let grid = grid::extract(&canvas, header.cell_size, resolution)?;
    Ok(GridReading { header, grid })
}

/// Builds the alphabet from a reference map carrying its own header.
///
/// Every interior cell counts, blank ones included, so map cell *i* in
/// raster order is named by the *i*-th character of the charset.
///
/// # Errors
///
/// See [`read_grid`]; additionally [`StegoError::Alphabet`] when the map has
/// no interior cells or the charset is empty.
pub fn build_alphabet(
    map: &RgbaImage,
    config: &GridConfig,
) -> Result<Alphabet, StegoError>
{
    let reading = read_grid(map, config)?;
    let alphabet = Alphabet::from_hashes(&config.charset, reading.grid.hashes)?;
    debug!(symbols = alphabet.len(), "built grid alphabet");
    Ok(alphabet)
}

/// Recovers the text hidden in `image` using the glyphs of `map`.
///
/// Cells that are blank or too far from every glyph read as spaces. When no
/// cell matches at all the result is [`crate::symbols::UNREADABLE`].
///
/// # Errors
///
/// Returns [`StegoError`] when either image cannot be read.
pub fn decode_text(
    image: &RgbaImage,
    map: &RgbaImage,
    config: &GridConfig,
) -> Result<String, StegoError>
{
    let alphabet = build_alphabet(map, config)?;
    let reading = read_grid(image, config)?;

    let acceptance = config.acceptance();
    let symbols: Vec<Option<char>> = reading
        .grid
        .hashes
        .iter()
        .map(|hash| alphabet.classify(hash, acceptance).map(|found| found.name))
        .collect();

    let matched = symbols.iter().flatten().count();
    info!(cells = symbols.len(), matched, "matched grid cells");

    Ok(assemble(
        &symbols,
        reading.grid.rows,
        reading.grid.cols,
        reading.header.fields.vertical,
    ))
}

#[cfg(test)]
mod tests
{
    use image::Rgba;

    use super::*;
    use crate::stego::{EncodeOptions, HeaderFields, embed_header};
    use crate::symbols::UNREADABLE;

    const PAPER: Rgba<u8> = Rgba([240, 240, 240, 255]);
    const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);
    const CELL: u32 = 20;

    /// Glyph strokes as (x, y, width, height) inside a 20 pixel cell.
    const GLYPHS: [(u32, u32, u32, u32); 3] =
        [(4, 3, 4, 14), (3, 4, 14, 4), (10, 10, 6, 6)];

    /// "cab" on the first interior row, "b" below the "c".
    const MESSAGE: [(u32, u32, usize); 4] =
        [(1, 1, 2), (2, 1, 0), (3, 1, 1), (1, 2, 1)];

    fn render(
        width: u32,
        height: u32,
        vertical: bool,
        cells: &[(u32, u32, usize)],
    ) -> RgbaImage
    {
        let mut image = RgbaImage::from_pixel(width, height, PAPER);
        for &(col, row, glyph) in cells
        {
            let (x, y, w, h) = GLYPHS[glyph];
            for dy in 0..h
            {
                for dx in 0..w
                {
                    image.put_pixel(
                        col * CELL + x + dx,
                        row * CELL + y + dy,
                        INK,
                    );
                }
            }
        }

        let options = EncodeOptions {
            cell_size: CELL,
            vertical,
            background: None,
        };
        embed_header(&mut image, &options).expect("failed to embed header");
        image
    }

    fn map(width: u32) -> RgbaImage
    {
        render(width, 60, false, &[(1, 1, 0), (2, 1, 1), (3, 1, 2)])
    }

    #[test]
    fn canvas_width_becomes_divisible_by_stripes()
    {
        assert_eq!(canvas_size(100, 50, u64::MAX), (600, 300, 6.0));
        assert_eq!(canvas_size(240, 7, u64::MAX), (240, 7, 1.0));
    }

    #[test]
    fn canvas_area_is_capped()
    {
        // 600x300 shrinks by a quarter on each side
        assert_eq!(canvas_size(100, 50, 45_000), (150, 75, 1.5));
    }

    #[test]
    fn normalised_canvas_matches_size()
    {
        let image = RgbaImage::from_pixel(100, 50, PAPER);
        let (canvas, ratio) =
            normalize_canvas(&image, u64::MAX).expect("canvas should build");

        assert_eq!(canvas.dimensions(), (600, 300));
        assert!((ratio - 6.0).abs() < f64::EPSILON);
        assert_eq!(*canvas.get_pixel(300, 150), PAPER);
    }

    #[test]
    fn rejects_empty_image()
    {
        let error = normalize_canvas(&RgbaImage::new(0, 4), u64::MAX)
            .expect_err("no pixels");
        assert!(matches!(error, StegoError::EmptyImage));
    }

    #[test]
    fn map_cells_become_alphabet_in_raster_order()
    {
        let alphabet = build_alphabet(&map(240), &GridConfig::default())
            .expect("map should read");

        // 10 interior columns on a single interior row
        assert_eq!(alphabet.len(), 10);
        let names: String =
            alphabet.symbols().iter().map(|symbol| symbol.name).collect();
        assert_eq!(names, "abcdefghij");
        assert!(!alphabet.symbols()[2].hash.is_degenerate());
        assert!(alphabet.symbols()[3].hash.is_degenerate());
    }

    #[test]
    fn decodes_horizontal_text()
    {
        let target = render(240, 80, false, &MESSAGE);

        let text = decode_text(&target, &map(240), &GridConfig::default())
            .expect("target should decode");

        assert_eq!(text, "cab       \nb         \n");
    }

    #[test]
    fn decodes_vertical_text()
    {
        let target = render(240, 80, true, &MESSAGE);

        let text = decode_text(&target, &map(240), &GridConfig::default())
            .expect("target should decode");

        assert!(text.starts_with("cb\na \nb \n  \n"), "got {text:?}");
        assert_eq!(text.lines().count(), 10);
    }

    #[test]
    fn decodes_after_canvas_upscaling()
    {
        // 100 pixels wide is normalised to a 600 pixel canvas
        let target = render(100, 60, false, &MESSAGE[..3]);

        let text = decode_text(&target, &map(100), &GridConfig::default())
            .expect("target should decode");

        assert_eq!(text, "cab\n");
    }

    #[test]
    fn blank_target_is_unreadable()
    {
        let target = render(240, 80, false, &[]);
        let text = decode_text(&target, &map(240), &GridConfig::default())
            .expect("blank target still decodes");

        assert_eq!(text, UNREADABLE);
    }

    #[test]
    fn capped_canvas_still_reads_header()
    {
        let config = GridConfig {
            max_canvas_area: 40_000,
            ..GridConfig::default()
        };
        // 240x240 shrinks to a 166x166 canvas, off the stripe grid
        let target = render(240, 240, false, &MESSAGE);

        let reading = read_grid(&target, &config).expect("target should read");

        assert_eq!(reading.header.fields, HeaderFields {
            vertical: false,
            cell_size: 20,
            column_count: 12,
        });
        assert_eq!(reading.header.cell_size, 14);
        assert_eq!(reading.header.grid_width, 166);
        assert_eq!((reading.grid.rows, reading.grid.cols), (9, 9));
    }

    #[test]
    fn header_announcing_zero_cells_fails()
    {
        // a plain image reads as an all-zero header
        let image = RgbaImage::from_pixel(240, 60, PAPER);
        let error = read_grid(&image, &GridConfig::default())
            .expect_err("cell size is zero");

        assert!(matches!(error, StegoError::InvalidCellSize { cell_size: 0 }));
    }

    #[test]
    fn empty_charset_is_rejected()
    {
        let config = GridConfig {
            charset: String::new(),
            ..GridConfig::default()
        };
        let error = build_alphabet(&map(240), &config).expect_err("no names");

        assert!(matches!(error, StegoError::Alphabet(_)));
    }
}
