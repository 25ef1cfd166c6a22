//! Materialized hits.
//!
//! A [`Hit`] is a [`HitRecord`] whose edit string has been decoded against the
//! reference it cites. Hits are transient: they are materialized from the
//! [index](crate::index), folded into a [pileup](crate::pileup), and dropped.

use std::ops::Range;

use omics::coordinate::Strand;

use crate::alignment::Alignment;
use crate::alignment::edit;
use crate::alignment::reverse_complement;
use crate::record::HitRecord;
use crate::reference::Reference;

/// An error related to materializing a [`Hit`].
#[derive(Debug)]
pub enum Error {
    /// The reference interval runs past the end of the reference sequence.
    CoordinatesOutOfBounds(Range<usize>, usize),

    /// The edit string could not be decoded.
    MalformedAlignment(edit::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CoordinatesOutOfBounds(range, len) => write!(
                f,
                "reference interval {}-{} runs past the end of the reference ({} bases)",
                range.start, range.end, len
            ),
            Error::MalformedAlignment(err) => write!(f, "malformed alignment: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A hit with its alignment decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hit {
    /// The read id.
    read_id: String,

    /// The reference id.
    reference_id: String,

    /// The orientation of the read relative to the reference.
    strand: Strand,

    /// The aligned reference interval (0-based, half-open).
    reference: Range<usize>,

    /// The aligned read interval (0-based, half-open).
    read: Range<usize>,

    /// The length of the read.
    read_length: usize,

    /// The alignment score.
    score: i64,

    /// The normalized alignment, in forward reference orientation.
    alignment: Alignment,
}

impl Hit {
    /// Attempts to materialize a [`Hit`] from a record and the reference it
    /// cites.
    ///
    /// The reference slice is reverse complemented for reverse-oriented hits
    /// before decoding, and the decoded tracks are reverse complemented back
    /// so that every alignment reads in forward reference orientation. The
    /// tracks are then [normalized](Alignment::normalize).
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::hit::Hit;
    /// use refcons::record::HitRecord;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"AACCGGTT")?;
    ///
    /// let record = "read0\tseq0\t-\t3\t6\t1\t4\t4\t8\t1A2".parse::<HitRecord>()?;
    /// let hit = Hit::try_from_record(record, references.get("seq0").unwrap())?;
    ///
    /// assert_eq!(hit.alignment().reference(), b"CCGG");
    /// assert_eq!(hit.alignment().read(), b"CCTG");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_record(record: HitRecord, reference: &Reference) -> Result<Self, Error> {
        let range = record.reference();
        if range.end > reference.len() {
            return Err(Error::CoordinatesOutOfBounds(range, reference.len()));
        }

        let slice = &reference.sequence()[range.clone()];

        let alignment = match record.strand() {
            Strand::Positive => {
                let mut alignment =
                    edit::decode(record.edit(), slice).map_err(Error::MalformedAlignment)?;
                alignment.normalize();
                alignment
            }
            Strand::Negative => {
                let slice = reverse_complement(slice);
                let mut alignment =
                    edit::decode(record.edit(), &slice).map_err(Error::MalformedAlignment)?;
                alignment.reverse_complement();
                alignment.normalize();
                alignment
            }
        };

        Ok(Self {
            read_id: record.read_id().into(),
            reference_id: record.reference_id().into(),
            strand: record.strand().clone(),
            reference: range,
            read: record.read(),
            read_length: record.read_length(),
            score: record.score(),
            alignment,
        })
    }

    /// Gets the read id.
    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    /// Gets the reference id.
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// Gets the orientation.
    pub fn strand(&self) -> &Strand {
        &self.strand
    }

    /// Returns whether the read aligned in the forward orientation.
    pub fn is_forward(&self) -> bool {
        matches!(self.strand, Strand::Positive)
    }

    /// Gets the aligned reference interval (0-based, half-open).
    pub fn reference(&self) -> Range<usize> {
        self.reference.clone()
    }

    /// Gets the aligned read interval (0-based, half-open).
    pub fn read(&self) -> Range<usize> {
        self.read.clone()
    }

    /// Gets the read length.
    pub fn read_length(&self) -> usize {
        self.read_length
    }

    /// Gets the alignment score.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Gets the decoded alignment.
    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    /// Gets the reference position of the end of the read that faces its
    /// mate. For forward hits, this is the exclusive end of the hit (the
    /// 1-based position of its last aligned base). For reverse hits, this is
    /// the 0-based start of the hit.
    pub fn mapped_end(&self) -> usize {
        if self.is_forward() {
            self.reference.end
        } else {
            self.reference.start
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reference::ReferenceSet;

    /// Builds a hit from a raw hit line against a set of references.
    pub(crate) fn hit(references: &ReferenceSet, line: &str) -> Hit {
        let record = line.parse::<HitRecord>().unwrap();
        let reference = references.get(record.reference_id()).unwrap();
        Hit::try_from_record(record, reference).unwrap()
    }

    #[test]
    fn test_forward_hit() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let hit = hit(&references, "r\tseq0\t+\t2\t5\t1\t4\t4\t40\t1(a)1-1");
        assert_eq!(hit.reference(), 1..5);
        assert_eq!(hit.alignment().reference(), b"C-GTA");
        assert_eq!(hit.alignment().read(), b"CAG-A");
        assert!(hit.is_forward());
        assert_eq!(hit.mapped_end(), 5);

        Ok(())
    }

    #[test]
    fn test_reverse_hit_is_reported_in_forward_orientation()
    -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"AAAACCCC")?;

        // The reverse complement of `AACC` is `GGTT`; the read carries a `C`
        // in place of its first `T`.
        let hit = hit(&references, "r\tseq0\t-\t3\t6\t1\t4\t4\t40\t2C1");
        assert_eq!(hit.alignment().reference(), b"AACC");
        assert_eq!(hit.alignment().read(), b"AGCC");
        assert!(!hit.is_forward());
        assert_eq!(hit.mapped_end(), 2);

        Ok(())
    }

    #[test]
    fn test_coordinates_out_of_bounds() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGT")?;

        let record = "r\tseq0\t+\t2\t9\t1\t8\t8\t40\t8".parse::<HitRecord>()?;
        let err = Hit::try_from_record(record, references.get("seq0").unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "reference interval 1-9 runs past the end of the reference (4 bases)"
        );

        Ok(())
    }

    #[test]
    fn test_malformed_alignment() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGT")?;

        let record = "r\tseq0\t+\t1\t4\t1\t4\t4\t40\t2(a".parse::<HitRecord>()?;
        let err = Hit::try_from_record(record, references.get("seq0").unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed alignment: unclosed insertion starting at offset 1"
        );

        Ok(())
    }
}
