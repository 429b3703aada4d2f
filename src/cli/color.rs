//! Parsing of `--background` colours.
use image::Rgb;

use super::AppError;

/// Parses a hex colour such as `#f0e6d2` or `f0e6d2`.
///
/// # Errors
///
/// Returns [`AppError::InvalidColor`] unless the value is exactly six hex
/// digits, optionally prefixed with `#`.
pub(super) fn parse_color(value: &str) -> Result<Rgb<u8>, AppError>
{
    let digits = value.strip_prefix('#').unwrap_or(value);
    let mut channels = [0_u8; 3];
    hex::decode_to_slice(digits, &mut channels).map_err(|source| {
        AppError::InvalidColor {
            value: value.into(),
            source,
        }
    })?;
    Ok(Rgb(channels))
}
