//! A hit record.
//!
//! A hit record is one line of the hit stream describing one alignment of a
//! read (or its reverse complement) to a region of a reference sequence. It is
//! made up of ten tab-delimited fields:
//!
//! 1. The read id (only the first whitespace-delimited token is kept).
//! 2. The reference id (only the first whitespace-delimited token is kept).
//! 3. The orientation (`+` or `-`).
//! 4. The reference start (1-based, inclusive).
//! 5. The reference end (1-based, inclusive).
//! 6. The read start (1-based, inclusive).
//! 7. The read end (1-based, inclusive).
//! 8. The read length.
//! 9. The alignment score.
//! 10. The edit string (see [`crate::alignment::edit`]).
//!
//! Coordinates are converted to 0-based, half-open intervals when parsed.

use std::num::ParseIntError;
use std::ops::Range;
use std::str::FromStr;

use omics::coordinate::Strand;
use omics::coordinate::strand;

/// The delimiter for a hit record.
pub const DELIMITER: char = '\t';

/// The number of expected fields in a hit record.
pub const NUM_HIT_FIELDS: usize = 10;

/// An error related to the parsing of a hit record (a corrupt hit record).
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the hit line.
    IncorrectNumberOfFields(usize),

    /// The read id was empty.
    EmptyReadId,

    /// The reference id was empty.
    EmptyReferenceId,

    /// An invalid orientation.
    InvalidStrand(strand::Error),

    /// An invalid reference start.
    InvalidReferenceStart(ParseIntError),

    /// An invalid reference end.
    InvalidReferenceEnd(ParseIntError),

    /// An invalid read start.
    InvalidReadStart(ParseIntError),

    /// An invalid read end.
    InvalidReadEnd(ParseIntError),

    /// An invalid read length.
    InvalidReadLength(ParseIntError),

    /// An invalid score.
    InvalidScore(ParseIntError),

    /// A 1-based start coordinate of zero.
    ZeroStart,

    /// The reference end precedes the reference start.
    InvertedReferenceCoordinates(usize, usize),

    /// The read end precedes the read start.
    InvertedReadCoordinates(usize, usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields in hit record: expected {} fields, found {} fields",
                NUM_HIT_FIELDS, n
            ),
            ParseError::EmptyReadId => write!(f, "empty read id"),
            ParseError::EmptyReferenceId => write!(f, "empty reference id"),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {}", err),
            ParseError::InvalidReferenceStart(err) => {
                write!(f, "invalid reference start: {}", err)
            }
            ParseError::InvalidReferenceEnd(err) => write!(f, "invalid reference end: {}", err),
            ParseError::InvalidReadStart(err) => write!(f, "invalid read start: {}", err),
            ParseError::InvalidReadEnd(err) => write!(f, "invalid read end: {}", err),
            ParseError::InvalidReadLength(err) => write!(f, "invalid read length: {}", err),
            ParseError::InvalidScore(err) => write!(f, "invalid score: {}", err),
            ParseError::ZeroStart => {
                write!(f, "start coordinates are 1-based and cannot be zero")
            }
            ParseError::InvertedReferenceCoordinates(start, end) => write!(
                f,
                "reference end ({end}) precedes reference start ({start})"
            ),
            ParseError::InvertedReadCoordinates(start, end) => {
                write!(f, "read end ({end}) precedes read start ({start})")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A hit record within a hit stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HitRecord {
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

    /// The edit string.
    edit: String,
}

impl HitRecord {
    /// Gets the read id.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::record::HitRecord;
    ///
    /// let record = "read0/1 extra\tseq0\t+\t1\t4\t1\t4\t4\t8\t4".parse::<HitRecord>()?;
    /// assert_eq!(record.read_id(), "read0/1");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
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

    /// Gets the aligned reference interval (0-based, half-open).
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::record::HitRecord;
    ///
    /// let record = "read0\tseq0\t-\t3\t6\t2\t5\t6\t8\t4".parse::<HitRecord>()?;
    /// assert_eq!(record.reference(), 2..6);
    /// assert_eq!(record.read(), 1..5);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
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

    /// Gets the edit string.
    pub fn edit(&self) -> &str {
        &self.edit
    }
}

/// Gets the first whitespace-delimited token of a field.
fn first_token(field: &str) -> Option<&str> {
    field.split_whitespace().next()
}

/// Converts a 1-based, inclusive pair of coordinates into a 0-based,
/// half-open range.
fn to_half_open(start: usize, end: usize) -> Result<Range<usize>, ParseError> {
    match start.checked_sub(1) {
        Some(start) => Ok(start..end),
        None => Err(ParseError::ZeroStart),
    }
}

impl FromStr for HitRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.trim_end().split(DELIMITER).collect::<Vec<_>>();
        if parts.len() != NUM_HIT_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let read_id = first_token(parts[0]).ok_or(ParseError::EmptyReadId)?;
        let reference_id = first_token(parts[1]).ok_or(ParseError::EmptyReferenceId)?;
        let strand = parts[2].parse().map_err(ParseError::InvalidStrand)?;

        let reference_start = parts[3]
            .parse()
            .map_err(ParseError::InvalidReferenceStart)?;
        let reference_end = parts[4]
            .parse()
            .map_err(ParseError::InvalidReferenceEnd)?;
        let read_start = parts[5].parse().map_err(ParseError::InvalidReadStart)?;
        let read_end = parts[6].parse().map_err(ParseError::InvalidReadEnd)?;
        let read_length = parts[7].parse().map_err(ParseError::InvalidReadLength)?;
        let score = parts[8].parse().map_err(ParseError::InvalidScore)?;

        let reference = to_half_open(reference_start, reference_end)?;
        if reference.start > reference.end {
            return Err(ParseError::InvertedReferenceCoordinates(
                reference_start,
                reference_end,
            ));
        }

        let read = to_half_open(read_start, read_end)?;
        if read.start > read.end {
            return Err(ParseError::InvertedReadCoordinates(read_start, read_end));
        }

        Ok(HitRecord {
            read_id: read_id.into(),
            reference_id: reference_id.into(),
            strand,
            reference,
            read,
            read_length,
            score,
            edit: parts[9].into(),
        })
    }
}

impl std::fmt::Display for HitRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.read_id,
            self.reference_id,
            self.strand,
            self.reference.start + 1,
            self.reference.end,
            self.read.start + 1,
            self.read.end,
            self.read_length,
            self.score,
            self.edit,
            d = DELIMITER,
        )
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_valid_hit_record() -> Result<(), Box<dyn std::error::Error>> {
        let record = ">read7/2\tchr1 description\t-\t101\t135\t1\t35\t35\t3150\t10A24"
            .parse::<HitRecord>()?;

        assert_eq!(record.read_id(), ">read7/2");
        assert_eq!(record.reference_id(), "chr1");
        assert_eq!(record.strand(), &Strand::Negative);
        assert_eq!(record.reference(), 100..135);
        assert_eq!(record.read(), 0..35);
        assert_eq!(record.read_length(), 35);
        assert_eq!(record.score(), 3150);
        assert_eq!(record.edit(), "10A24");

        Ok(())
    }

    #[test]
    fn test_trailing_whitespace_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let record = "r\ts\t+\t1\t2\t1\t2\t2\t5\t2  \r".parse::<HitRecord>()?;
        assert_eq!(record.edit(), "2");
        Ok(())
    }

    #[test]
    fn test_hit_record_display() -> Result<(), Box<dyn std::error::Error>> {
        let line = "read0\tseq0\t+\t3\t6\t2\t5\t6\t8\t4";
        let record = line.parse::<HitRecord>()?;
        assert_eq!(record.to_string(), line);
        Ok(())
    }

    #[test]
    fn test_invalid_number_of_fields() {
        let err = "read0\tseq0\t+\t3\t6".parse::<HitRecord>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in hit record: expected 10 fields, found 5 fields"
        );
    }

    #[test]
    fn test_empty_read_id() {
        let err = " \tseq0\t+\t3\t6\t2\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(err.to_string(), "empty read id");
    }

    #[test]
    fn test_invalid_strand() {
        let err = "read0\tseq0\t?\t3\t6\t2\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid strand: "));
    }

    #[test]
    fn test_invalid_score() {
        let err = "read0\tseq0\t+\t3\t6\t2\t5\t6\t?\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid score: invalid digit found in string");
    }

    #[test]
    fn test_negative_coordinate() {
        let err = "read0\tseq0\t+\t-3\t6\t2\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid reference start: invalid digit found in string"
        );
    }

    #[test]
    fn test_zero_start() {
        let err = "read0\tseq0\t+\t0\t6\t2\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "start coordinates are 1-based and cannot be zero"
        );
    }

    #[test]
    fn test_inverted_reference_coordinates() {
        let err = "read0\tseq0\t+\t9\t6\t2\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "reference end (6) precedes reference start (9)"
        );
    }

    #[test]
    fn test_inverted_read_coordinates() {
        let err = "read0\tseq0\t+\t3\t6\t7\t5\t6\t8\t4"
            .parse::<HitRecord>()
            .unwrap_err();
        assert_eq!(err.to_string(), "read end (5) precedes read start (7)");
    }
}
