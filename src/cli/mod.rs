//! Command line front end.
//!
//! `encode` stamps the layout header, `decode` and `ocr` read text back, and
//! `header` prints what a header records. Image files are loaded and written
//! here so the library itself only sees pixel buffers.
mod color;
mod image_io;

use std::fs;
use std::path::Path;

use clap::{ArgAction, Args, Parser, Subcommand};
use const_format::formatcp;
use image::Rgb;
use thiserror::Error;
use tracing::info;
use tracing::subscriber::SetGlobalDefaultError;

use self::color::parse_color;
use self::image_io::{load_image, write_image};
use crate::config::{Config, ConfigError, MAX_CANVAS_AREA};
use crate::log;
use crate::ocr::{self, OcrError};
use crate::stego::{
    self, EncodeOptions, StegoError, decode_text, embed_header,
    normalize_canvas,
};

/// Errors that can be emitted while handling the CLI
#[derive(Debug, Error)]
pub enum AppError
{
    /// A file could not be read
    #[error("failed to read {path}: {source}")]
    Read
    {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written
    #[error("failed to write {path}: {source}")]
    Write
    {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    /// An image could not be decoded
    #[error("failed to open image {path}: {source}")]
    ImageOpen
    {
        path: Box<Path>,
        #[source]
        source: image::ImageError,
    },

    /// An image could not be encoded
    #[error("failed to encode {path} as {target_format}: {source}")]
    ImageEncode
    {
        path: Box<Path>,
        target_format: Box<str>,
        #[source]
        source: image::ImageError,
    },

    /// The image holds more pixels than the decoder accepts
    #[error(
        "{path} is {width}x{height}, larger than {MAX_CANVAS_AREA} pixels"
    )]
    ImageTooLarge
    {
        path: Box<Path>,
        width: u32,
        height: u32,
    },

    /// The output format is unsupported or lossy
    #[error("unsupported output format {extension}, use png, bmp, tiff or ppm")]
    UnsupportedFormat
    {
        extension: Box<str>
    },

    /// The background colour is not a hex triple
    #[error("invalid colour {value:?}, expected six hex digits: {source}")]
    InvalidColor
    {
        value: Box<str>,
        #[source]
        source: hex::FromHexError,
    },

    /// A steganography error occurred
    #[error(transparent)]
    Stego(#[from] StegoError),

    /// A segmentation error occurred
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// The configuration file is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging was already initialised
    #[error(transparent)]
    Logging(#[from] SetGlobalDefaultError),
}

/// The main CLI parser
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Hide text in images as glyph grids and read it back",
    after_help = formatcp!(
        "Input images may hold at most {} megapixels",
        MAX_CANVAS_AREA / 1_000_000
    )
)]
struct Cli
{
    /// Log more details to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

/// The main command
#[derive(Subcommand)]
enum Command
{
    Encode(EncodingArgs),
    Decode(DecodingArgs),
    Ocr(OcrArgs),
    Header(HeaderArgs),
}

/// Stamp the layout header onto a rendered message image.
#[derive(Args)]
struct EncodingArgs
{
    /// Image with the message drawn as a grid of glyph cells.
    input: Box<Path>,
    /// Output path (png, bmp, tiff or ppm).
    output: Box<Path>,
    /// Side of one glyph cell in pixels.
    #[arg(short = 's', long, value_name = "PIXELS")]
    cell_size: u32,
    /// Text runs top to bottom.
    #[arg(long)]
    vertical: bool,
    /// Background colour as hex, defaults to the top-left pixel.
    #[arg(short, long, value_name = "HEX", value_parser = parse_color)]
    background: Option<Rgb<u8>>,
}

/// Read grid-encoded text from an image.
#[derive(Args)]
struct DecodingArgs
{
    /// Image that contains the text.
    input: Box<Path>,
    /// Reference map holding one glyph per cell.
    #[arg(short, long, value_name = "PATH")]
    map: Box<Path>,
    /// Optional file to write the decoded text. Prints to stdout when omitted.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    output_text: Option<Box<Path>>,
    /// JSON configuration overriding the decoder defaults.
    #[arg(short, long, value_name = "PATH")]
    config: Option<Box<Path>>,
}

/// Read rendered text by segmenting it into glyphs.
#[derive(Args)]
struct OcrArgs
{
    /// Image with rendered text.
    input: Box<Path>,
    /// Reference image holding the glyphs in charset order.
    #[arg(short, long, value_name = "PATH")]
    map: Box<Path>,
    /// Optional file to write the text. Prints to stdout when omitted.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    output_text: Option<Box<Path>>,
    /// JSON configuration overriding the reader defaults.
    #[arg(short, long, value_name = "PATH")]
    config: Option<Box<Path>>,
}

/// Print the layout recorded in an image header.
#[derive(Args)]
struct HeaderArgs
{
    /// Image carrying a header.
    input: Box<Path>,
}

/// Parses CLI arguments and executes the requested operation.
///
/// # Errors
///
/// Returns [`AppError`] when reading or writing files, decoding images, or
/// running the readers fails.
pub fn run() -> Result<(), AppError>
{
    let cli = Cli::parse();
    log::init_subscriber(log::level_for_verbosity(cli.verbose))?;

    match cli.command
    {
        Command::Encode(args) => handle_encode(&args),
        Command::Decode(args) => handle_decode(&args),
        Command::Ocr(args) => handle_ocr(&args),
        Command::Header(args) => handle_header(&args),
    }
}

/// Loads the configuration file, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<Config, AppError>
{
    path.map_or_else(|| Ok(Config::default()), Config::from_path)
        .map_err(AppError::from)
}

/// Writes `text` to `output`, or to stdout when no path is given.
fn emit_text(text: &str, output: Option<&Path>) -> Result<(), AppError>
{
    if let Some(path) = output
    {
        fs::write(path, text.as_bytes()).map_err(|source| AppError::Write {
            path: path.into(),
            source,
        })?;
    }
    else
    {
        print!("{text}");
        if !text.ends_with('\n')
        {
            println!();
        }
    }

    Ok(())
}

/// Handles stamping the header onto an image.
///
/// # Errors
///
/// Returns [`AppError`] when reading or writing files, or when the layout
/// cannot be recorded.
fn handle_encode(args: &EncodingArgs) -> Result<(), AppError>
{
    let mut image = load_image(&args.input)?;
    let options = EncodeOptions {
        cell_size: args.cell_size,
        vertical: args.vertical,
        background: args.background,
    };

    let fields = embed_header(&mut image, &options)?;
    write_image(&image, &args.output)?;
    info!(
        columns = fields.column_count,
        output = %args.output.display(),
        "wrote encoded image"
    );

    Ok(())
}

/// Handles reading grid-encoded text.
///
/// # Errors
///
/// Returns [`AppError`] when loading the inputs or decoding fails.
fn handle_decode(args: &DecodingArgs) -> Result<(), AppError>
{
    let config = load_config(args.config.as_deref())?;
    let image = load_image(&args.input)?;
    let map = load_image(&args.map)?;

    let text = decode_text(&image, &map, &config.grid)?;
    emit_text(&text, args.output_text.as_deref())
}

/// Handles reading segmented text.
///
/// # Errors
///
/// Returns [`AppError`] when loading the inputs fails or no glyph is found.
fn handle_ocr(args: &OcrArgs) -> Result<(), AppError>
{
    let config = load_config(args.config.as_deref())?;
    let image = load_image(&args.input)?;
    let map = load_image(&args.map)?;

    let text = ocr::read_text(&image, &map, &config.ocr)?;
    emit_text(&text, args.output_text.as_deref())
}

/// Handles printing the decoded header.
///
/// # Errors
///
/// Returns [`AppError`] when the image cannot be loaded or holds no header.
fn handle_header(args: &HeaderArgs) -> Result<(), AppError>
{
    let image = load_image(&args.input)?;
    let (canvas, ratio) = normalize_canvas(&image, MAX_CANVAS_AREA)?;
    let header = stego::header::decode(&canvas, canvas.width(), ratio)?;

    println!("vertical: {}", header.fields.vertical);
    println!(
        "cell size: {} px ({} px on a {}x{} canvas)",
        header.fields.cell_size,
        header.cell_size,
        canvas.width(),
        canvas.height()
    );
    println!("columns: {}", header.fields.column_count);
    println!("grid width: {} px", header.grid_width);

    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::fmt::{Debug, Formatter, Result};
    use std::path::Path;

    use clap::{CommandFactory, Parser};
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    use super::*;

    // Debug impls are only needed in tests
    impl Debug for Cli
    {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result
        {
            f.debug_struct("Cli")
                .field("verbose", &self.verbose)
                .field("command", &self.command)
                .finish()
        }
    }

    impl Debug for Command
    {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result
        {
            match self
            {
                Self::Encode(args) => f
                    .debug_struct("Command::Encode")
                    .field("input", &args.input)
                    .field("output", &args.output)
                    .field("cell_size", &args.cell_size)
                    .finish_non_exhaustive(),
                Self::Decode(args) => f
                    .debug_struct("Command::Decode")
                    .field("input", &args.input)
                    .field("map", &args.map)
                    .finish_non_exhaustive(),
                Self::Ocr(args) => f
                    .debug_struct("Command::Ocr")
                    .field("input", &args.input)
                    .field("map", &args.map)
                    .finish_non_exhaustive(),
                Self::Header(args) => f
                    .debug_struct("Command::Header")
                    .field("input", &args.input)
                    .finish(),
            }
        }
    }

    const PAPER: Rgba<u8> = Rgba([240, 236, 228, 255]);

    #[test]
    fn clap_configuration_is_sound()
    {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_encode_with_layout_flags()
    {
        let cli = Cli::try_parse_from([
            "glyphmark",
            "encode",
            "message.png",
            "stamped.png",
            "--cell-size",
            "24",
            "--vertical",
            "--background",
            "#f0ece4",
        ])
        .expect("expected encode command");

        match cli.command
        {
            Command::Encode(args) =>
            {
                assert_eq!(args.input.as_ref(), Path::new("message.png"));
                assert_eq!(args.output.as_ref(), Path::new("stamped.png"));
                assert_eq!(args.cell_size, 24);
                assert!(args.vertical);
                assert_eq!(args.background, Some(Rgb([0xf0, 0xec, 0xe4])));
            },
            other => panic!("expected encode command, got {other:?}"),
        }
    }

    #[test]
    fn encode_requires_cell_size()
    {
        Cli::try_parse_from(["glyphmark", "encode", "in.png", "out.png"])
            .expect_err("missing cell size must error");
    }

    #[test]
    fn encode_rejects_bad_background()
    {
        Cli::try_parse_from([
            "glyphmark",
            "encode",
            "in.png",
            "out.png",
            "-s",
            "20",
            "-b",
            "white",
        ])
        .expect_err("colour names are not hex");
    }

    #[test]
    fn parses_decode_with_map_and_config()
    {
        let cli = Cli::try_parse_from([
            "glyphmark",
            "-vv",
            "decode",
            "secret.png",
            "--map",
            "map.png",
            "--output",
            "message.txt",
            "--config",
            "reader.json",
        ])
        .expect("expected decode command");

        assert_eq!(cli.verbose, 2);
        match cli.command
        {
            Command::Decode(args) =>
            {
                assert_eq!(args.input.as_ref(), Path::new("secret.png"));
                assert_eq!(args.map.as_ref(), Path::new("map.png"));
                assert_eq!(
                    args.output_text.as_deref(),
                    Some(Path::new("message.txt"))
                );
                assert_eq!(
                    args.config.as_deref(),
                    Some(Path::new("reader.json"))
                );
            },
            other => panic!("expected decode command, got {other:?}"),
        }
    }

    #[test]
    fn decode_requires_map()
    {
        Cli::try_parse_from(["glyphmark", "decode", "secret.png"])
            .expect_err("missing map must error");
    }

    #[test]
    fn verbose_flag_is_global()
    {
        let cli = Cli::try_parse_from([
            "glyphmark",
            "ocr",
            "page.png",
            "-m",
            "glyphs.png",
            "-v",
        ])
        .expect("expected ocr command");

        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Command::Ocr(_)));
    }

    #[test]
    fn parses_header_command()
    {
        let cli = Cli::try_parse_from(["glyphmark", "header", "stamped.png"])
            .expect("expected header command");

        match cli.command
        {
            Command::Header(args) =>
            {
                assert_eq!(args.input.as_ref(), Path::new("stamped.png"));
            },
            other => panic!("expected header command, got {other:?}"),
        }
    }

    #[test]
    fn encode_writes_readable_header()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let input = dir.path().join("message.png");
        let output = dir.path().join("stamped.bmp");
        RgbaImage::from_pixel(240, 120, PAPER)
            .save(&input)
            .expect("failed to write input");

        let args = EncodingArgs {
            input: input.into(),
            output: output.clone().into(),
            cell_size: 20,
            vertical: true,
            background: None,
        };
        handle_encode(&args).expect("encode should succeed");

        let stamped = load_image(&output).expect("output should load");
        let header =
            stego::header::decode(&stamped, 240, 1.0).expect("header decodes");
        assert!(header.fields.vertical);
        assert_eq!(header.fields.cell_size, 20);
        assert_eq!(header.fields.column_count, 12);
    }

    #[test]
    fn encode_refuses_lossy_output()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let input = dir.path().join("message.png");
        RgbaImage::from_pixel(48, 48, PAPER)
            .save(&input)
            .expect("failed to write input");

        let args = EncodingArgs {
            input: input.into(),
            output: dir.path().join("stamped.jpg").into(),
            cell_size: 8,
            vertical: false,
            background: None,
        };
        let error = handle_encode(&args).expect_err("jpeg output");

        assert!(matches!(error, AppError::UnsupportedFormat { .. }));
    }

    #[test]
    fn decode_writes_unreadable_notice_for_blank_images()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let stamped = dir.path().join("stamped.png");
        let text_path = dir.path().join("message.txt");

        let mut image = RgbaImage::from_pixel(240, 80, PAPER);
        embed_header(&mut image, &EncodeOptions {
            cell_size: 20,
            vertical: false,
            background: None,
        })
        .expect("failed to embed");
        image.save(&stamped).expect("failed to write image");

        let args = DecodingArgs {
            input: stamped.clone().into(),
            map: stamped.into(),
            output_text: Some(text_path.clone().into()),
            config: None,
        };
        handle_decode(&args).expect("decode should succeed");

        let text = fs::read_to_string(&text_path).expect("text written");
        assert_eq!(text, crate::symbols::UNREADABLE);
    }

    #[test]
    fn ocr_reports_blank_images()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let blank = dir.path().join("blank.png");
        RgbaImage::from_pixel(30, 30, PAPER)
            .save(&blank)
            .expect("failed to write image");

        let args = OcrArgs {
            input: blank.clone().into(),
            map: blank.into(),
            output_text: None,
            config: None,
        };
        let error = handle_ocr(&args).expect_err("nothing to read");

        assert!(matches!(error, AppError::Ocr(_)));
    }

    #[test]
    fn invalid_config_is_reported()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let config = dir.path().join("reader.json");
        fs::write(&config, "{ not json").expect("failed to write config");

        let error =
            load_config(Some(config.as_path())).expect_err("invalid json");

        assert!(matches!(error, AppError::Config(ConfigError::Parse { .. })));
        assert_eq!(load_config(None).expect("defaults"), Config::default());
    }
}
