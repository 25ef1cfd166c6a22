//! Per-position evidence accumulated against one reference sequence.
//!
//! A [`Pileup`] is written to by the resolvers while hits are folded in and
//! only read afterwards, when the consensus is called. Every update is
//! additive, so pileups built from disjoint sets of reads can be combined with
//! [`Pileup::merge()`].

use std::collections::HashMap;

use crate::alignment::GAP;
use crate::hit::Hit;
use crate::reference::Reference;
use crate::reference::ReferenceSet;

pub mod tally;

pub use tally::Tally;

/// Read bases that carry no usable evidence.
///
/// `X` is emitted by colour-space aligners for unresolvable positions.
const UNINFORMATIVE_BASES: &[u8] = b"NX";

/// An error related to a [`Pileup`].
#[derive(Debug)]
pub enum Error {
    /// Two pileups for different references were merged.
    ReferenceMismatch(String, String),

    /// Two pileups of different lengths were merged.
    LengthMismatch(usize, usize),

    /// A pileup was merged into a set without a pileup of the same name.
    UnknownReference(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReferenceMismatch(a, b) => {
                write!(f, "cannot merge pileups for different references: {a} and {b}")
            }
            Error::LengthMismatch(a, b) => {
                write!(f, "cannot merge pileups of different lengths: {a} and {b}")
            }
            Error::UnknownReference(name) => {
                write!(f, "cannot merge pileup for unknown reference: {name}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Accumulated evidence for every position of a reference sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Pileup {
    /// The name of the reference.
    name: String,

    /// Observed read bases per position, including deletions as [`GAP`].
    bases: Vec<Tally<u8>>,

    /// Inserted runs observed immediately before each position.
    insertions: Vec<Tally<Vec<u8>>>,

    /// Unambiguous depth per position.
    depth: Vec<u32>,

    /// Fractional depth from every qualifying hit, ambiguous or not.
    ambiguous_depth: Vec<f64>,
}

impl Pileup {
    /// Creates an empty [`Pileup`] covering every position of a reference.
    pub fn new(reference: &Reference) -> Self {
        let len = reference.len();

        Self {
            name: reference.name().to_string(),
            bases: vec![Tally::default(); len],
            insertions: vec![Tally::default(); len],
            depth: vec![0; len],
            ambiguous_depth: vec![0.0; len],
        }
    }

    /// Gets the name of the reference.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the number of positions.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    /// Returns whether the pileup covers no positions.
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Gets the read bases observed at a position.
    pub fn bases(&self, position: usize) -> &Tally<u8> {
        &self.bases[position]
    }

    /// Gets the inserted runs observed immediately before a position.
    pub fn insertions(&self, position: usize) -> &Tally<Vec<u8>> {
        &self.insertions[position]
    }

    /// Gets the unambiguous depth series.
    pub fn depth(&self) -> &[u32] {
        &self.depth
    }

    /// Gets the ambiguous depth series.
    pub fn ambiguous_depth(&self) -> &[f64] {
        &self.ambiguous_depth
    }

    /// Folds an unambiguous hit into the base and insertion tables and the
    /// unambiguous depth.
    ///
    /// The first and last `trim` alignment columns are skipped, though
    /// skipped reference bases still advance the position. A run of gaps in
    /// the reference track is an insertion and is counted before the next
    /// reference position. `N` and `X` read bases add depth without adding to
    /// the base table.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::hit::Hit;
    /// use refcons::pileup::Pileup;
    /// use refcons::record::HitRecord;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGTACGT")?;
    /// let reference = references.get("seq0").unwrap();
    ///
    /// let record = "r\tseq0\t+\t1\t4\t1\t6\t6\t60\t2(tt)1N".parse::<HitRecord>()?;
    /// let hit = Hit::try_from_record(record, reference)?;
    ///
    /// let mut pileup = Pileup::new(reference);
    /// pileup.add_unambiguous(&hit, 0);
    ///
    /// assert_eq!(pileup.depth(), &[1, 1, 1, 1, 0, 0, 0, 0]);
    /// assert_eq!(pileup.insertions(2).get(b"TT".as_slice()), 1);
    /// assert_eq!(pileup.bases(2).get(&b'G'), 1);
    /// assert!(pileup.bases(3).is_empty());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn add_unambiguous(&mut self, hit: &Hit, trim: usize) {
        let alignment = hit.alignment();
        let reference = alignment.reference();
        let read = alignment.read();
        let len = alignment.len();

        let mut position = hit.reference().start;
        let mut i = 0;

        while i < trim.min(len) {
            if reference[i] != GAP {
                position += 1;
            }
            i += 1;
        }

        let end = len.saturating_sub(trim);

        while i < end {
            if reference[i] == GAP {
                let mut j = i + 1;
                while j < len && reference[j] == GAP {
                    j += 1;
                }

                if let Some(tally) = self.insertions.get_mut(position) {
                    tally.add(&read[i..j], 1);
                }

                i = j;
            } else {
                let Some(depth) = self.depth.get_mut(position) else {
                    break;
                };

                *depth += 1;

                if !UNINFORMATIVE_BASES.contains(&read[i]) {
                    self.bases[position].add(&read[i], 1);
                }

                position += 1;
                i += 1;
            }
        }
    }

    /// Adds a `1 / n` share of ambiguous depth over the whole reference span
    /// of a hit that is one of `n` equally good placements of a read.
    pub fn add_ambiguous(&mut self, hit: &Hit, n: usize) {
        let share = 1.0 / n as f64;
        let range = hit.reference();
        let end = range.end.min(self.ambiguous_depth.len());

        for depth in &mut self.ambiguous_depth[range.start.min(end)..end] {
            *depth += share;
        }
    }

    /// Adds all of the evidence in `other` into `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::pileup::Pileup;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGT")?;
    /// references.add("seq1", b"ACGT")?;
    ///
    /// let mut a = Pileup::new(references.get("seq0").unwrap());
    /// let b = Pileup::new(references.get("seq1").unwrap());
    ///
    /// let err = a.merge(&b).unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "cannot merge pileups for different references: seq0 and seq1"
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn merge(&mut self, other: &Pileup) -> Result<(), Error> {
        if self.name != other.name {
            return Err(Error::ReferenceMismatch(
                self.name.clone(),
                other.name.clone(),
            ));
        }

        if self.len() != other.len() {
            return Err(Error::LengthMismatch(self.len(), other.len()));
        }

        for (a, b) in self.bases.iter_mut().zip(&other.bases) {
            a.merge(b);
        }

        for (a, b) in self.insertions.iter_mut().zip(&other.insertions) {
            a.merge(b);
        }

        for (a, b) in self.depth.iter_mut().zip(&other.depth) {
            *a += b;
        }

        for (a, b) in self.ambiguous_depth.iter_mut().zip(&other.ambiguous_depth) {
            *a += b;
        }

        Ok(())
    }
}

/// One [`Pileup`] per loaded reference, in reference order.
#[derive(Clone, Debug, PartialEq)]
pub struct Pileups {
    /// The pileups.
    inner: Vec<Pileup>,

    /// A lookup from reference name to its position within `inner`.
    lookup: HashMap<String, usize>,
}

impl Pileups {
    /// Creates an empty [`Pileup`] for every reference in a set.
    pub fn new(references: &ReferenceSet) -> Self {
        let inner = references.iter().map(Pileup::new).collect::<Vec<_>>();
        let lookup = inner
            .iter()
            .enumerate()
            .map(|(i, pileup)| (pileup.name().to_string(), i))
            .collect();

        Self { inner, lookup }
    }

    /// Gets the pileup for a reference.
    pub fn get(&self, name: &str) -> Option<&Pileup> {
        self.lookup.get(name).map(|i| &self.inner[*i])
    }

    /// Returns an iterator over the pileups in reference order.
    pub fn iter(&self) -> impl Iterator<Item = &Pileup> {
        self.inner.iter()
    }

    /// Folds an unambiguous hit into the pileup of the reference it cites.
    ///
    /// Hits citing a reference without a pileup are ignored.
    pub fn add_unambiguous(&mut self, hit: &Hit, trim: usize) {
        if let Some(i) = self.lookup.get(hit.reference_id()) {
            self.inner[*i].add_unambiguous(hit, trim);
        }
    }

    /// Adds a share of ambiguous depth to the pileup of the reference a hit
    /// cites.
    ///
    /// Hits citing a reference without a pileup are ignored.
    pub fn add_ambiguous(&mut self, hit: &Hit, n: usize) {
        if let Some(i) = self.lookup.get(hit.reference_id()) {
            self.inner[*i].add_ambiguous(hit, n);
        }
    }

    /// Merges every pileup of `other` into the pileup of the same name.
    pub fn merge(&mut self, other: &Pileups) -> Result<(), Error> {
        for pileup in &other.inner {
            match self.lookup.get(pileup.name()) {
                Some(i) => self.inner[*i].merge(pileup)?,
                None => return Err(Error::UnknownReference(pileup.name().to_string())),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::tests::hit;
    use crate::reference::ReferenceSet;

    /// Creates a reference set with a single, ten base reference.
    fn references() -> ReferenceSet {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"AAAACCCCGG").unwrap();
        references
    }

    #[test]
    fn test_deletion_is_counted_as_a_gap_base() {
        let references = references();
        let mut pileup = Pileup::new(references.get("seq0").unwrap());

        pileup.add_unambiguous(&hit(&references, "r\tseq0\t+\t5\t8\t1\t3\t3\t30\t2-1"), 0);

        assert_eq!(pileup.depth(), &[0, 0, 0, 0, 1, 1, 1, 1, 0, 0]);
        // The deletion is rolled to the right end of the homopolymer.
        assert_eq!(pileup.bases(6).get(&GAP), 0);
        assert_eq!(pileup.bases(7).get(&GAP), 1);
        assert!(pileup.insertions(6).is_empty());
    }

    #[test]
    fn test_trim_skips_columns_but_advances_position() {
        let references = references();
        let mut pileup = Pileup::new(references.get("seq0").unwrap());

        pileup.add_unambiguous(&hit(&references, "r\tseq0\t+\t1\t6\t1\t6\t6\t60\t6"), 2);

        assert_eq!(pileup.depth(), &[0, 0, 1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(pileup.bases(2).get(&b'A'), 1);
        assert_eq!(pileup.bases(3).get(&b'A'), 1);
    }

    #[test]
    fn test_trailing_insertion_past_the_end_is_dropped() {
        let references = references();
        let mut pileup = Pileup::new(references.get("seq0").unwrap());

        pileup.add_unambiguous(&hit(&references, "r\tseq0\t+\t9\t10\t1\t4\t4\t40\t2(aa)"), 0);

        assert_eq!(pileup.depth()[8..], [1, 1]);
        assert!(pileup.insertions.iter().all(|tally| tally.is_empty()));
    }

    #[test]
    fn test_ambiguous_hits_share_one_unit_of_depth() {
        let references = references();
        let mut pileup = Pileup::new(references.get("seq0").unwrap());

        // Scores [100, 100, 50] with exact ties: two qualifying hits.
        let first = hit(&references, "r\tseq0\t+\t1\t4\t1\t4\t4\t100\t4");
        let second = hit(&references, "r\tseq0\t+\t3\t6\t1\t4\t4\t100\t2CC");

        pileup.add_ambiguous(&first, 2);
        pileup.add_ambiguous(&second, 2);

        assert_eq!(
            pileup.ambiguous_depth(),
            &[0.5, 0.5, 1.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]
        );
        assert!(pileup.depth().iter().all(|depth| *depth == 0));
        assert!(pileup.bases.iter().all(|tally| tally.is_empty()));
    }

    #[test]
    fn test_merge_adds_element_wise() -> Result<(), Box<dyn std::error::Error>> {
        let references = references();
        let reference = references.get("seq0").unwrap();
        let first = hit(&references, "r\tseq0\t+\t1\t4\t1\t4\t4\t40\t4");
        let second = hit(&references, "s\tseq0\t+\t3\t6\t1\t5\t5\t40\t2(g)2");

        let mut whole = Pileup::new(reference);
        whole.add_unambiguous(&first, 0);
        whole.add_ambiguous(&first, 1);
        whole.add_unambiguous(&second, 0);
        whole.add_ambiguous(&second, 1);

        let mut left = Pileup::new(reference);
        left.add_unambiguous(&first, 0);
        left.add_ambiguous(&first, 1);

        let mut right = Pileup::new(reference);
        right.add_unambiguous(&second, 0);
        right.add_ambiguous(&second, 1);

        left.merge(&right)?;
        assert_eq!(left, whole);
        assert_eq!(left.insertions(4).get(b"G".as_slice()), 1);

        Ok(())
    }
}
