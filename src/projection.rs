//! Projection of reference coordinates onto a called consensus.
//!
//! A consensus may carry insertions and deletions relative to its reference,
//! so a reference position does not always land on the same offset in the
//! consensus. A [`Projection`] splits the reference-vs-consensus alignment
//! into maximal gap-free blocks and answers which consensus intervals a
//! reference interval corresponds to.

use std::ops::Range;

use rust_lapper as lapper;

use crate::alignment::Alignment;
use crate::alignment::GAP;

/// An error related to constructing a [`ContiguousPair`].
#[derive(Debug)]
pub enum Error {
    /// The two intervals don't have the same length, so they cannot map
    /// contiguously onto one another.
    LengthsDontMatch(usize, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::LengthsDontMatch(reference, consensus) => write!(
                f,
                "reference interval length ({reference}) doesn't match consensus interval length \
                 ({consensus})"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A reference interval and a consensus interval of equal length that map
/// onto one another base for base.
///
/// Both intervals are 0-based and half-open.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContiguousPair {
    /// The reference interval.
    reference: Range<usize>,

    /// The consensus interval.
    consensus: Range<usize>,
}

impl ContiguousPair {
    /// Attempts to create a new [`ContiguousPair`].
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::projection::ContiguousPair;
    ///
    /// let pair = ContiguousPair::try_new(10..20, 12..22)?;
    /// assert_eq!(pair.reference(), 10..20);
    /// assert_eq!(pair.consensus(), 12..22);
    ///
    /// let err = ContiguousPair::try_new(10..20, 12..20).unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "reference interval length (10) doesn't match consensus interval length (8)"
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(reference: Range<usize>, consensus: Range<usize>) -> Result<Self, Error> {
        if reference.len() != consensus.len() {
            return Err(Error::LengthsDontMatch(reference.len(), consensus.len()));
        }

        Ok(Self {
            reference,
            consensus,
        })
    }

    /// Gets the reference interval.
    pub fn reference(&self) -> Range<usize> {
        self.reference.clone()
    }

    /// Gets the consensus interval.
    pub fn consensus(&self) -> Range<usize> {
        self.consensus.clone()
    }

    /// Clamps the pair to the part overlapping the reference interval
    /// `start..end`.
    ///
    /// Returns `None` if nothing overlaps.
    pub fn clamp(&self, start: usize, end: usize) -> Option<Self> {
        let clamped_start = self.reference.start.max(start);
        let clamped_end = self.reference.end.min(end);

        if clamped_start >= clamped_end {
            return None;
        }

        let offset = clamped_start - self.reference.start;
        let len = clamped_end - clamped_start;
        let consensus_start = self.consensus.start + offset;

        Some(Self {
            reference: clamped_start..clamped_end,
            consensus: consensus_start..consensus_start + len,
        })
    }
}

/// A lookup from reference intervals to consensus intervals.
#[derive(Debug)]
pub struct Projection {
    /// The gap-free blocks keyed by their reference interval.
    inner: lapper::Lapper<usize, ContiguousPair>,
}

impl Projection {
    /// Creates a [`Projection`] from an alignment whose first track is the
    /// reference and whose second track is the consensus.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::alignment::Alignment;
    /// use refcons::projection::Projection;
    ///
    /// let alignment = Alignment::try_new(b"ACG--TACGT".to_vec(), b"ACGTTTA-GT".to_vec())?;
    /// let projection = Projection::new(&alignment);
    ///
    /// let blocks = projection
    ///     .blocks()
    ///     .map(|pair| (pair.reference(), pair.consensus()))
    ///     .collect::<Vec<_>>();
    ///
    /// assert_eq!(blocks, vec![(0..3, 0..3), (3..5, 5..7), (6..8, 7..9)]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(alignment: &Alignment) -> Self {
        let mut intervals = Vec::new();

        let mut reference_position = 0;
        let mut consensus_position = 0;
        let mut block: Option<(usize, usize)> = None;

        for (reference, consensus) in alignment.reference().iter().zip(alignment.read()) {
            let aligned = *reference != GAP && *consensus != GAP;

            match (aligned, block) {
                (true, None) => block = Some((reference_position, consensus_position)),
                (false, Some(start)) => {
                    intervals.push(interval(start, reference_position, consensus_position));
                    block = None;
                }
                _ => {}
            }

            if *reference != GAP {
                reference_position += 1;
            }

            if *consensus != GAP {
                consensus_position += 1;
            }
        }

        if let Some(start) = block {
            intervals.push(interval(start, reference_position, consensus_position));
        }

        Self {
            inner: lapper::Lapper::new(intervals),
        }
    }

    /// Gets every gap-free block in reference order.
    pub fn blocks(&self) -> impl Iterator<Item = &ContiguousPair> {
        self.inner.iter().map(|interval| &interval.val)
    }

    /// Projects the reference interval `start..end` onto the consensus.
    ///
    /// Every block overlapping the interval is returned, clamped to it. If no
    /// block overlaps (the interval lies entirely within deleted bases, for
    /// example), `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::alignment::Alignment;
    /// use refcons::projection::Projection;
    ///
    /// let alignment = Alignment::try_new(b"ACG--TACGT".to_vec(), b"ACGTTTA-GT".to_vec())?;
    /// let projection = Projection::new(&alignment);
    ///
    /// let results = projection.project(1, 4).unwrap();
    /// assert_eq!(results.len(), 2);
    /// assert_eq!(results[0].consensus(), 1..3);
    /// assert_eq!(results[1].consensus(), 5..6);
    ///
    /// assert!(projection.project(5, 6).is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn project(&self, start: usize, end: usize) -> Option<Vec<ContiguousPair>> {
        let results = self
            .inner
            .find(start, end)
            .filter_map(|interval| interval.val.clamp(start, end))
            .collect::<Vec<_>>();

        match results.is_empty() {
            true => None,
            false => Some(results),
        }
    }
}

/// Creates the lapper interval for a block starting at `start` and ending at
/// the given positions.
fn interval(
    (reference_start, consensus_start): (usize, usize),
    reference_end: usize,
    consensus_end: usize,
) -> lapper::Interval<usize, ContiguousPair> {
    lapper::Interval {
        start: reference_start,
        stop: reference_end,
        val: ContiguousPair {
            reference: reference_start..reference_end,
            consensus: consensus_start..consensus_end,
        },
    }
}
