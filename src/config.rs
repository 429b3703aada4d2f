//! Decoding configuration.
//!
//! Both reading modes are tuned separately. The defaults reproduce the
//! behaviour the reference maps are drawn for; a JSON file may override any
//! subset of the fields:
//!
//! ```json
//! {
//!     "grid": { "max_distance": 8 },
//!     "ocr": { "charset": "0123456789", "threshold": "otsu" }
//! }
//! ```
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::ThresholdMode;
use crate::symbols::{Acceptance, DEFAULT_CHARSET};

/// Largest canvas area, in pixels, the grid reader will work on.
pub const MAX_CANVAS_AREA: u64 = 16_000 * 16_000 / 2;

/// Errors that can be emitted while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError
{
    /// The file could not be read
    #[error("failed to read config {path}: {source}")]
    Read
    {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("invalid config {path}: {source}")]
    Parse
    {
        path: Box<Path>,
        #[source]
        source: serde_json::Error,
    },

    /// A fingerprint resolution of zero was requested
    #[error("{mode} fingerprint resolution must be positive")]
    ZeroResolution
    {
        mode: &'static str
    },

    /// The OCR classifier sample side is zero
    #[error("ocr sample side must be positive")]
    ZeroSampleSide,
}

/// Settings for the striped-header grid reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig
{
    /// Characters assigned to reference cells in raster order.
    pub charset: String,
    /// Side of the square every cell is resampled to before hashing.
    pub fingerprint_resolution: u32,
    /// Matches at or above this Hamming distance read as blank; `null`
    /// accepts every best match.
    pub max_distance: Option<u32>,
    /// Canvas area cap applied while normalising the image width.
    pub max_canvas_area: u64,
}

impl Default for GridConfig
{
    fn default() -> Self
    {
        Self {
            charset: DEFAULT_CHARSET.into(),
            fingerprint_resolution: 8,
            max_distance: Some(5),
            max_canvas_area: MAX_CANVAS_AREA,
        }
    }
}

impl GridConfig
{
    #[must_use]
    pub fn acceptance(&self) -> Acceptance
    {
        Acceptance::from_max_distance(self.max_distance)
    }
}

/// Settings for the segmentation reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig
{
    /// Characters assigned to reference glyphs in reading order.
    pub charset: String,
    /// Side of the square every glyph is resampled to before hashing.
    pub fingerprint_resolution: u32,
    /// Matches at or above this Hamming distance read as blank; `null`
    /// accepts every best match.
    pub max_distance: Option<u32>,
    /// Threshold used when hashing resampled glyphs.
    pub threshold: ThresholdMode,
    /// Side of the samples handed to an external classifier.
    pub sample_side: u32,
}

impl Default for OcrConfig
{
    fn default() -> Self
    {
        Self {
            charset: DEFAULT_CHARSET.into(),
            fingerprint_resolution: 16,
            max_distance: None,
            threshold: ThresholdMode::Mean,
            sample_side: 28,
        }
    }
}

impl OcrConfig
{
    #[must_use]
    pub fn acceptance(&self) -> Acceptance
    {
        Acceptance::from_max_distance(self.max_distance)
    }
}

/// Complete configuration for both readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config
{
    pub grid: GridConfig,
    pub ocr: OcrConfig,
}

impl Config
{
    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is not valid
    /// JSON for this structure, or holds out-of-range values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError>
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            ConfigError::Read {
                path: path.into(),
                source,
            }
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.into(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot express as types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero resolutions or sample sides.
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        if self.grid.fingerprint_resolution == 0
        {
            return Err(ConfigError::ZeroResolution { mode: "grid" });
        }
        if self.ocr.fingerprint_resolution == 0
        {
            return Err(ConfigError::ZeroResolution { mode: "ocr" });
        }
        if self.ocr.sample_side == 0
        {
            return Err(ConfigError::ZeroSampleSide);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use tempfile::TempDir;

    use super::*;

    fn write_config(contents: &str) -> (TempDir, Box<Path>)
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, contents).expect("failed to write config");
        (dir, path.into_boxed_path())
    }

    #[test]
    fn defaults_match_reader_constants()
    {
        let config = Config::default();

        assert_eq!(config.grid.fingerprint_resolution, 8);
        assert_eq!(config.grid.acceptance(), Acceptance::Below(5));
        assert_eq!(config.ocr.fingerprint_resolution, 16);
        assert_eq!(config.ocr.acceptance(), Acceptance::BestMatch);
        assert_eq!(config.ocr.charset, DEFAULT_CHARSET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults()
    {
        let (_dir, path) = write_config(
            r#"{ "grid": { "max_distance": null }, "ocr": { "threshold": "otsu" } }"#,
        );

        let config = Config::from_path(&path).expect("config should load");

        assert_eq!(config.grid.acceptance(), Acceptance::BestMatch);
        assert_eq!(config.grid.charset, DEFAULT_CHARSET);
        assert_eq!(config.ocr.threshold, ThresholdMode::Otsu);
        assert_eq!(config.ocr.sample_side, 28);
    }

    #[test]
    fn rejects_unknown_fields()
    {
        let (_dir, path) = write_config(r#"{ "grid": { "cell": 4 } }"#);
        let error = Config::from_path(&path).expect_err("unknown field");

        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_zero_resolution()
    {
        let (_dir, path) =
            write_config(r#"{ "ocr": { "fingerprint_resolution": 0 } }"#);
        let error = Config::from_path(&path).expect_err("zero resolution");

        assert!(matches!(error, ConfigError::ZeroResolution { mode: "ocr" }));
    }

    #[test]
    fn missing_file_reports_path()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let path = dir.path().join("absent.json");
        let error = Config::from_path(&path).expect_err("file is missing");

        assert!(matches!(
            error,
            ConfigError::Read { path: reported, .. } if *reported == *path
        ));
    }
}
