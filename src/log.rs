//! Diagnostic logging.
//!
//! Library code only emits `tracing` events; a binary installs the
//! subscriber once at startup:
//!
//! ```
//! glyphmark::log::init_subscriber(tracing::Level::DEBUG)
//!     .expect("no other subscriber is installed");
//! ```
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::FmtSubscriber;

/// Installs a global subscriber writing events up to `max_level` to stderr.
///
/// # Errors
///
/// Returns [`SetGlobalDefaultError`] when a global subscriber is already
/// installed.
pub fn init_subscriber(max_level: Level) -> Result<(), SetGlobalDefaultError>
{
    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Maps a repeated `-v` count to a level, starting from WARN.
#[must_use]
pub fn level_for_verbosity(occurrences: u8) -> Level
{
    match occurrences
    {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
