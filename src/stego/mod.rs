//! Grid steganography: text drawn as a uniform grid of glyph cells, with the
//! layout recorded in a striped header along the top of the image.
//!
//! # Layout
//!
//! - The top band holds 24 colour stripes encoding the vertical flag, the
//!   cell size and the column count (see [`header`])
//! - The body is divided into square cells; the outer ring of cells is
//!   ignored and every interior cell holds one glyph or nothing
//! - Glyphs are identified by comparing cell fingerprints against a
//!   reference map drawn with the same layout
//!
//! # Errors
//!
//! Returns [`StegoError`] when embedding or reading the layout fails.
use thiserror::Error;

use crate::symbols::SymbolError;

mod decode;
mod encode;
pub mod grid;
pub mod header;

pub use decode::{
    GridReading, build_alphabet, decode_text, normalize_canvas, read_grid,
};
pub use encode::{EncodeOptions, embed_header};
pub use grid::CellGrid;
pub use header::{DecodedHeader, HeaderFields};

/// Errors that can be emitted while embedding or reading a grid layout
#[derive(Debug, Error)]
pub enum StegoError
{
    /// The image has no pixels
    #[error("image is empty")]
    EmptyImage,

    /// The cell size is zero or does not fit the header byte
    #[error("cell size {cell_size} must be between 1 and 255 pixels")]
    InvalidCellSize
    {
        cell_size: u32
    },

    /// More columns fit the image than the header can record
    #[error("{columns} cell columns exceed the header limit of 255")]
    ColumnOverflow
    {
        columns: u32
    },

    /// The header strip or decoding canvas would exceed addressable size
    #[error("canvas width of {width} pixels is too large")]
    CanvasTooLarge
    {
        width: u64
    },

    /// The image cannot hold a readable header
    #[error("{width}x{height} image is too small to hold a header")]
    HeaderTooSmall
    {
        width: u32, height: u32
    },

    /// The reference map yielded no usable alphabet
    #[error("invalid reference map: {0}")]
    Alphabet(#[from] SymbolError),
}
