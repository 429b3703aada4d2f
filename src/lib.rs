//! Hides short text in images as grids of glyph cells and reads it back.
//!
//! - [`stego`]: striped layout header plus grid fingerprinting and decoding
//! - [`ocr`]: grid-free reading through glyph segmentation
//! - [`symbols`]: nearest-fingerprint matching and text assembly
//! - [`analysis`]: binarisation, fingerprints and segmentation primitives
pub mod analysis;
pub mod cli;
pub mod config;
pub mod log;
pub mod ocr;
pub mod stego;
pub mod symbols;
