//! Nearest-hash classification of fingerprints.
//!
//! An [`Alphabet`] pairs characters with the fingerprints discovered in a
//! reference image. The pairing is positional: the i-th fingerprint found in
//! raster order receives the i-th character of the configured charset.
use thiserror::Error;
use tracing::warn;

use crate::analysis::Hash;

mod text;

pub use text::{UNREADABLE, assemble};

/// Characters assigned to reference cells when no charset is configured.
pub const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789.-!?";

/// Errors raised while building an alphabet
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError
{
    /// Neither the charset nor the reference image produced an entry
    #[error("alphabet is empty")]
    Empty,

    /// Reference hashes were fingerprinted at different resolutions
    #[error(
        "reference hash for {name:?} has {actual} bits, expected {expected}"
    )]
    MixedResolution
    {
        name: char,
        expected: usize,
        actual: usize,
    },
}

/// A named reference fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol
{
    pub name: char,
    pub hash: Hash,
}

/// When a best match is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance
{
    /// Accept only distances strictly below the bound.
    Below(u32),
    /// Always accept the closest entry.
    BestMatch,
}

impl Acceptance
{
    /// `Some(bound)` maps to [`Acceptance::Below`], `None` to
    /// [`Acceptance::BestMatch`].
    #[must_use]
    pub fn from_max_distance(max_distance: Option<u32>) -> Self
    {
        max_distance.map_or(Self::BestMatch, Self::Below)
    }

    fn accepts(self, distance: u32) -> bool
    {
        match self
        {
            Self::Below(bound) => distance < bound,
            Self::BestMatch => true,
        }
    }
}

/// The outcome of a successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match
{
    pub name: char,
    pub distance: u32,
}

/// Ordered reference table used for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet
{
    symbols: Vec<Symbol>,
}

impl Alphabet
{
    /// Pairs the characters of `charset` with `hashes` in order.
    ///
    /// Hashes beyond the end of the charset are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::Empty`] when no pair can be formed and
    /// [`SymbolError::MixedResolution`] when the hashes differ in length.
    pub fn from_hashes<H>(charset: &str, hashes: H) -> Result<Self, SymbolError>
    where
        H: IntoIterator<Item = Hash>,
    {
        let mut hashes = hashes.into_iter();
        let symbols: Vec<Symbol> = charset
            .chars()
            .zip(hashes.by_ref())
            .map(|(name, hash)| Symbol { name, hash })
            .collect();

        let leftover = hashes.count();
        if leftover > 0
        {
            warn!(leftover, "reference cells exceed the charset, ignoring");
        }

        Self::new(symbols)
    }

    /// Builds an alphabet from explicit symbols.
    ///
    /// # Errors
    ///
    /// See [`Alphabet::from_hashes`].
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, SymbolError>
    {
        let expected = symbols.first().ok_or(SymbolError::Empty)?.hash.len();
        if let Some(odd) =
            symbols.iter().find(|symbol| symbol.hash.len() != expected)
        {
            return Err(SymbolError::MixedResolution {
                name: odd.name,
                expected,
                actual: odd.hash.len(),
            });
        }

        Ok(Self { symbols })
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol]
    {
        &self.symbols
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    /// Finds the entry closest to `hash`.
    ///
    /// Degenerate hashes are blank and never match. Among entries at the
    /// minimum distance the first one wins. `None` means blank, either
    /// because nothing was comparable or because `acceptance` rejected the
    /// best distance.
    #[must_use]
    pub fn classify(&self, hash: &Hash, acceptance: Acceptance) -> Option<Match>
    {
        if hash.is_degenerate()
        {
            return None;
        }

        let mut best: Option<Match> = None;
        for symbol in &self.symbols
        {
            let Some(distance) = hash.hamming_distance(&symbol.hash)
            else
            {
                continue;
            };

            if best.is_none_or(|current| distance < current.distance)
            {
                best = Some(Match {
                    name: symbol.name,
                    distance,
                });
            }
        }

        best.filter(|candidate| acceptance.accepts(candidate.distance))
    }
}
