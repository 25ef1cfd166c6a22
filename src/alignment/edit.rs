//! Decoding of compact edit strings into explicit alignments.
//!
//! An edit string describes how a read differs from the reference slice it was
//! mapped to. It is made up of the following tokens:
//!
//! - A run of decimal digits: that many matching bases.
//! - Text between `(` and `)`: bases inserted in the read.
//! - A run of `-`: that many reference bases deleted from the read.
//! - Any other single character: one substituted base in the read.
//!
//! Matched, deleted, and substituted bases each consume exactly one base of
//! the reference slice. Inserted bases consume none.

use std::num::ParseIntError;

use crate::alignment::Alignment;
use crate::alignment::GAP;

/// The character that opens an insertion.
const INSERTION_OPEN: u8 = b'(';

/// The character that closes an insertion.
const INSERTION_CLOSE: u8 = b')';

/// An error related to decoding an edit string (a malformed alignment).
#[derive(Debug)]
pub enum Error {
    /// An insertion was opened at the given offset but never closed.
    UnclosedInsertion(usize),

    /// An insertion was closed at the given offset without being opened.
    UnopenedInsertion(usize),

    /// The reference slice ran out while decoding the token at the given
    /// offset.
    ReferenceExhausted(usize),

    /// A match length could not be parsed.
    InvalidMatchLength(ParseIntError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnclosedInsertion(offset) => {
                write!(f, "unclosed insertion starting at offset {offset}")
            }
            Error::UnopenedInsertion(offset) => {
                write!(f, "insertion closed at offset {offset} without being opened")
            }
            Error::ReferenceExhausted(offset) => write!(
                f,
                "reference slice exhausted while decoding token at offset {offset}"
            ),
            Error::InvalidMatchLength(err) => write!(f, "invalid match length: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Decodes an edit string against the reference slice it describes.
///
/// Inserted and substituted bases are upper-cased. The reference slice is
/// copied into the reference track as-is.
///
/// # Examples
///
/// ```
/// use refcons::alignment::edit;
///
/// let alignment = edit::decode("2(tt)1-G", b"ACGTA")?;
/// assert_eq!(alignment.reference(), b"AC--GTA");
/// assert_eq!(alignment.read(), b"ACTTG-G");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode(edit: &str, reference: &[u8]) -> Result<Alignment> {
    let bytes = edit.as_bytes();

    let mut reference_track = Vec::with_capacity(reference.len());
    let mut read_track = Vec::with_capacity(reference.len());
    let mut remaining = reference;

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            INSERTION_OPEN => {
                let close = bytes[i + 1..]
                    .iter()
                    .position(|c| *c == INSERTION_CLOSE)
                    .map(|offset| i + 1 + offset)
                    .ok_or(Error::UnclosedInsertion(i))?;

                for base in &bytes[i + 1..close] {
                    reference_track.push(GAP);
                    read_track.push(base.to_ascii_uppercase());
                }

                i = close + 1;
            }
            INSERTION_CLOSE => return Err(Error::UnopenedInsertion(i)),
            c if c.is_ascii_digit() => {
                let end = run_end(bytes, i, |c| c.is_ascii_digit());
                let n = edit[i..end]
                    .parse::<usize>()
                    .map_err(Error::InvalidMatchLength)?;

                let matched = consume(&mut remaining, n, i)?;
                reference_track.extend_from_slice(matched);
                read_track.extend_from_slice(matched);

                i = end;
            }
            GAP => {
                let end = run_end(bytes, i, |c| c == GAP);

                let deleted = consume(&mut remaining, end - i, i)?;
                reference_track.extend_from_slice(deleted);
                read_track.extend(std::iter::repeat(GAP).take(deleted.len()));

                i = end;
            }
            c => {
                let substituted = consume(&mut remaining, 1, i)?;
                reference_track.extend_from_slice(substituted);
                read_track.push(c.to_ascii_uppercase());

                i += 1;
            }
        }
    }

    // SAFETY: every branch above pushes the same number of bytes onto both
    // tracks, so the lengths always match.
    Ok(Alignment::try_new(reference_track, read_track).unwrap())
}

/// Finds the end of the run of bytes starting at `start` that satisfy
/// `predicate`.
fn run_end(bytes: &[u8], start: usize, predicate: impl Fn(u8) -> bool) -> usize {
    bytes[start..]
        .iter()
        .position(|c| !predicate(*c))
        .map(|offset| start + offset)
        .unwrap_or(bytes.len())
}

/// Takes `n` bases off the front of the remaining reference slice.
fn consume<'a>(remaining: &mut &'a [u8], n: usize, offset: usize) -> Result<&'a [u8]> {
    if remaining.len() < n {
        return Err(Error::ReferenceExhausted(offset));
    }

    let (taken, rest) = remaining.split_at(n);
    *remaining = rest;
    Ok(taken)
}
