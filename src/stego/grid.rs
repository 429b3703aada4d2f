//! Uniform cell grid over the body of an image.
use image::{GenericImageView, Pixel};
use tracing::debug;

use super::StegoError;
use crate::analysis::{Hash, Rect, ThresholdMode, fingerprint, region};

/// Fingerprints of the interior cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid
{
    pub hashes: Vec<Hash>,
    pub rows: u32,
    pub cols: u32,
}

/// Splits `body` into `cell_size` squares and fingerprints every cell except
/// the outer ring.
///
/// The ring is skipped because border cells are anti-aliased or cropped, and
/// the top row holds the header band.
///
/// # Errors
///
/// Returns [`StegoError::InvalidCellSize`] when `cell_size` is zero.
pub fn extract<I>(
    body: &I,
    cell_size: u32,
    resolution: u32,
) -> Result<CellGrid, StegoError>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8> + 'static,
{
    if cell_size == 0
    {
        return Err(StegoError::InvalidCellSize { cell_size });
    }

    let total_cols = body.width() / cell_size;
    let total_rows = body.height() / cell_size;
    let cols = total_cols.saturating_sub(2);
    let rows = total_rows.saturating_sub(2);

    let mut hashes = Vec::with_capacity(rows as usize * cols as usize);
    for row in 1..=rows
    {
        for col in 1..=cols
        {
            let cell = Rect::new(
                col * cell_size,
                row * cell_size,
                cell_size,
                cell_size,
            );
            hashes.push(fingerprint(
                &*region(body, cell),
                resolution,
                ThresholdMode::Mean,
            ));
        }
    }

    debug!(rows, cols, cell_size, "extracted cell grid");

    Ok(CellGrid { hashes, rows, cols })
}

#[cfg(test)]
mod tests
{
    use image::{Rgba, RgbaImage};

    use super::*;

    const PAPER: Rgba<u8> = Rgba([240, 240, 240, 255]);
    const INK: Rgba<u8> = Rgba([30, 30, 30, 255]);

    /// Draws an L shape into the cell at (`col`, `row`).
    fn ink_cell(image: &mut RgbaImage, cell_size: u32, col: u32, row: u32)
    {
        let (left, top) = (col * cell_size, row * cell_size);
        for offset in 2..cell_size - 2
        {
            image.put_pixel(left + 2, top + offset, INK);
            image.put_pixel(left + offset, top + cell_size - 3, INK);
        }
    }

    #[test]
    fn skips_the_outer_ring()
    {
        let mut image = RgbaImage::from_pixel(50, 40, PAPER);
        // border cells carry ink that must be ignored
        ink_cell(&mut image, 10, 0, 0);
        ink_cell(&mut image, 10, 4, 3);
        // interior cell (col 2, row 1) is the second interior cell
        ink_cell(&mut image, 10, 2, 1);

        let grid = extract(&image, 10, 8).expect("valid cell size");

        assert_eq!((grid.rows, grid.cols), (2, 3));
        assert_eq!(grid.hashes.len(), 6);
        for (index, hash) in grid.hashes.iter().enumerate()
        {
            assert_eq!(hash.len(), 64);
            assert_eq!(hash.is_degenerate(), index != 1, "cell {index}");
        }
    }

    #[test]
    fn identical_cells_share_a_hash()
    {
        let mut image = RgbaImage::from_pixel(60, 36, PAPER);
        ink_cell(&mut image, 12, 1, 1);
        ink_cell(&mut image, 12, 3, 1);

        let grid = extract(&image, 12, 8).expect("valid cell size");

        assert_eq!(grid.hashes.len(), 3);
        assert_eq!(grid.hashes[0], grid.hashes[2]);
        assert_eq!(grid.hashes[0].hamming_distance(&grid.hashes[2]), Some(0));
    }

    #[test]
    fn partial_cells_are_dropped()
    {
        // 3 whole cells per axis, remainder pixels ignored
        let image = RgbaImage::from_pixel(37, 35, PAPER);
        let grid = extract(&image, 11, 8).expect("valid cell size");

        assert_eq!((grid.rows, grid.cols), (1, 1));
    }

    #[test]
    fn tiny_images_have_no_interior()
    {
        let image = RgbaImage::from_pixel(15, 15, PAPER);
        let grid = extract(&image, 10, 8).expect("valid cell size");

        assert_eq!((grid.rows, grid.cols), (0, 0));
        assert!(grid.hashes.is_empty());
    }

    #[test]
    fn rejects_zero_cell_size()
    {
        let image = RgbaImage::from_pixel(15, 15, PAPER);
        let error = extract(&image, 0, 8).expect_err("zero cell size");

        assert!(matches!(error, StegoError::InvalidCellSize { cell_size: 0 }));
    }
}
