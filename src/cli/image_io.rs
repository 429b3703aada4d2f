//! CLI image helpers.
//!
//! Normalizes extensions, loads RGBA buffers, and writes files with a
//! lossless encoder picked by extension. Lossy formats would destroy the
//! header stripes, so they are refused.
use std::fs::File;
use std::io::{Error, ErrorKind};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use super::AppError;
use crate::config::MAX_CANVAS_AREA;

/// Extensions [`write_image`] can encode.
pub(super) const SUPPORTED_EXTENSIONS: [&str; 5] =
    ["png", "bmp", "tiff", "tif", "ppm"];

/// Normalizes the extension of a path to lowercase.
pub(super) fn normalized_extension(path: impl AsRef<Path>) -> Option<String>
{
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Loads an image from the specified path as an RGBA buffer.
///
/// # Errors
///
/// * [`AppError::Read`] when the path is a directory
/// * [`AppError::ImageOpen`] when the image cannot be loaded
/// * [`AppError::ImageTooLarge`] when the image holds more pixels than the
///   decoder works on
pub(super) fn load_image(path: impl AsRef<Path>) -> Result<RgbaImage, AppError>
{
    let path = path.as_ref();
    if path.is_dir()
    {
        let message = format!("{} is a directory", path.display());
        return Err(AppError::Read {
            path: path.into(),
            source: Error::new(ErrorKind::IsADirectory, message),
        });
    }

    let image = image::open(path).map_err(|source| AppError::ImageOpen {
        path: path.into(),
        source,
    })?;

    let (width, height) = (image.width(), image.height());
    if u64::from(width) * u64::from(height) > MAX_CANVAS_AREA
    {
        return Err(AppError::ImageTooLarge {
            path: path.into(),
            width,
            height,
        });
    }

    Ok(image.into_rgba8())
}

/// Writes `image` with the encoder matching the extension of `output`.
///
/// The extension is checked before the file is created.
///
/// # Errors
///
/// * [`AppError::UnsupportedFormat`] when the extension is not supported
/// * [`AppError::Write`] when the file cannot be created
/// * [`AppError::ImageEncode`] when the image cannot be encoded
///
/// # Supported Extensions
///
/// * png
/// * bmp
/// * tiff / tif
/// * ppm (alpha is dropped)
pub(super) fn write_image(
    image: &RgbaImage,
    output: impl AsRef<Path>,
) -> Result<(), AppError>
{
    let output = output.as_ref();
    let extension = normalized_extension(output);
    let format = match extension.as_deref()
    {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext) => ext,
        other =>
        {
            let extension = other.unwrap_or("<unknown>").into();
            return Err(AppError::UnsupportedFormat { extension });
        },
    };

    let mut file = File::create(output).map_err(|source| AppError::Write {
        path: output.into(),
        source,
    })?;
    let (width, height) = image.dimensions();

    let encoded = match format
    {
        "png" => PngEncoder::new_with_quality(
            &mut file,
            CompressionType::Default,
            FilterType::Adaptive,
        )
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8),
        "bmp" => BmpEncoder::new(&mut file).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        "tiff" | "tif" => TiffEncoder::new(&mut file).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        _ =>
        {
            // binary pixmaps carry no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            PnmEncoder::new(&mut file)
                .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
                .write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
        },
    };

    encoded.map_err(|source| AppError::ImageEncode {
        path: output.into(),
        target_format: format.into(),
        source,
    })
}
