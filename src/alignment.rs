//! Pairwise alignments between a read and a reference slice.
//!
//! An [`Alignment`] is two equal-length tracks: the reference track and the
//! read track. A gap in either track is written as [`GAP`]. Alignments are
//! decoded from a compact edit string with [`edit::decode()`] and then brought
//! into a canonical form with [`normalize::normalize()`] so that equivalent
//! alignments of different reads agree column for column.

pub mod edit;
pub mod normalize;

/// The gap character used in both alignment tracks.
pub const GAP: u8 = b'-';

/// An error related to constructing an [`Alignment`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The two tracks do not have the same length.
    TrackLengthMismatch(usize, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TrackLengthMismatch(reference, read) => write!(
                f,
                "reference track length ({reference}) doesn't match read track length ({read})"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A two-track alignment of a read against a reference slice.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alignment {
    /// The reference track.
    reference: Vec<u8>,

    /// The read track.
    read: Vec<u8>,
}

impl Alignment {
    /// Attempts to create a new [`Alignment`] from two tracks.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::alignment::Alignment;
    ///
    /// let alignment = Alignment::try_new(b"AC-GT".to_vec(), b"ACTG-".to_vec())?;
    /// assert_eq!(alignment.len(), 5);
    ///
    /// let err = Alignment::try_new(b"ACGT".to_vec(), b"AC".to_vec()).unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "reference track length (4) doesn't match read track length (2)"
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(reference: Vec<u8>, read: Vec<u8>) -> Result<Self, Error> {
        if reference.len() != read.len() {
            return Err(Error::TrackLengthMismatch(reference.len(), read.len()));
        }

        Ok(Self { reference, read })
    }

    /// Gets the reference track.
    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// Gets the read track.
    pub fn read(&self) -> &[u8] {
        &self.read
    }

    /// Gets the number of columns in the alignment.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Returns whether the alignment has no columns.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Consumes `self` and returns the reference and read tracks.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.reference, self.read)
    }

    /// Reverse complements both tracks in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::alignment::Alignment;
    ///
    /// let mut alignment = Alignment::try_new(b"AAC-".to_vec(), b"A-CG".to_vec())?;
    /// alignment.reverse_complement();
    ///
    /// assert_eq!(alignment.reference(), b"-GTT");
    /// assert_eq!(alignment.read(), b"CG-T");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn reverse_complement(&mut self) {
        reverse_complement_in_place(&mut self.reference);
        reverse_complement_in_place(&mut self.read);
    }

    /// Normalizes the placement of gap runs in both tracks.
    ///
    /// The read track is normalized against the reference track first, then
    /// the reference track against the (normalized) read track.
    pub fn normalize(&mut self) {
        normalize::normalize(&mut self.read, &self.reference);
        normalize::normalize(&mut self.reference, &self.read);
    }
}

/// Complements a single nucleotide.
///
/// Only `ACGT` (in either case) are complemented; every other byte,
/// including [`GAP`] and `N`, is returned unchanged.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        other => other,
    }
}

/// Reverse complements a sequence.
///
/// # Examples
///
/// ```
/// use refcons::alignment::reverse_complement;
///
/// assert_eq!(reverse_complement(b"AACGTN-t"), b"a-NACGTT".to_vec());
/// ```
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|base| complement(*base)).collect()
}

/// Reverse complements a sequence in place.
fn reverse_complement_in_place(sequence: &mut [u8]) {
    sequence.reverse();

    for base in sequence.iter_mut() {
        *base = complement(*base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement_leaves_other_symbols_untouched() {
        assert_eq!(complement(b'N'), b'N');
        assert_eq!(complement(GAP), GAP);
        assert_eq!(complement(b'X'), b'X');
    }

    #[test]
    fn test_reverse_complement_twice_is_identity() {
        let sequence = b"ACGGT-ANcgt";
        assert_eq!(reverse_complement(&reverse_complement(sequence)), sequence);
    }

    #[test]
    fn test_alignment_normalize_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let mut alignment = Alignment::try_new(b"ACAAAGT".to_vec(), b"AC-AAGT".to_vec())?;
        alignment.normalize();

        let once = alignment.clone();
        alignment.normalize();

        assert_eq!(alignment, once);
        assert_eq!(alignment.reference(), b"ACAAAGT");
        assert_eq!(alignment.read(), b"ACAA-GT");

        Ok(())
    }
}
