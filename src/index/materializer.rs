//! Materialization of indexed hits.

use std::io;
use std::io::BufRead;
use std::io::Seek;
use std::io::SeekFrom;

use crate::hit::Hit;
use crate::index::Index;
use crate::reader::Reader;
use crate::record::HitRecord;
use crate::reference::ReferenceSet;

/// An error related to materializing hits.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// No line could be read at an indexed offset.
    MissingRecord(u64),

    /// The line at an indexed offset is not a valid hit record.
    InvalidRecord(crate::record::hit::ParseError, u64),

    /// The line at an indexed offset belongs to a different read.
    ReadIdMismatch {
        /// The read id the index expected.
        expected: String,

        /// The read id found in the stream.
        found: String,
    },

    /// A hit cites a reference that is not loaded.
    UnknownReference(String),

    /// A hit could not be materialized against its reference.
    InvalidHit(crate::hit::Error, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::MissingRecord(offset) => {
                write!(f, "no hit record found at offset {offset}")
            }
            Error::InvalidRecord(err, offset) => {
                write!(f, "corrupt hit record at offset {offset}: {err}")
            }
            Error::ReadIdMismatch { expected, found } => write!(
                f,
                "read id mismatch: index expected {expected}, hit stream has {found}"
            ),
            Error::UnknownReference(name) => write!(f, "unknown reference: {name}"),
            Error::InvalidHit(err, read_id) => write!(f, "invalid hit for {read_id}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Turns indexed offsets back into [`Hit`]s.
///
/// The underlying reader must be positioned over the same bytes the
/// [`Index`] was built from.
#[derive(Debug)]
pub struct Materializer<'a, T>
where
    T: BufRead + Seek,
{
    /// The hit stream reader.
    reader: Reader<T>,

    /// The index of the hit stream.
    index: &'a Index,

    /// The loaded references.
    references: &'a ReferenceSet,

    /// A reusable line buffer.
    buffer: String,
}

impl<'a, T> Materializer<'a, T>
where
    T: BufRead + Seek,
{
    /// Creates a new [`Materializer`].
    pub fn new(inner: T, index: &'a Index, references: &'a ReferenceSet) -> Self {
        Self {
            reader: Reader::new(inner),
            index,
            references,
            buffer: String::new(),
        }
    }

    /// Gets the index.
    pub fn index(&self) -> &'a Index {
        self.index
    }

    /// Gets the loaded references.
    pub fn references(&self) -> &'a ReferenceSet {
        self.references
    }

    /// Materializes every hit for a read, sorted by descending score.
    ///
    /// Hits with equal scores keep their stream order. A read that is not in
    /// the index has no hits.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    ///
    /// use refcons::index;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let data = b"read0\tseq0\t+\t1\t4\t1\t4\t4\t10\t4\nread0\tseq0\t+\t5\t8\t1\t4\t4\t20\t4\n";
    ///
    /// let index = index::Builder.try_build_from(refcons::Reader::new(&data[..]))?;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGTTTTT")?;
    ///
    /// let mut materializer =
    ///     index::Materializer::new(Cursor::new(&data[..]), &index, &references);
    /// let hits = materializer.materialize("read0")?;
    ///
    /// assert_eq!(hits.len(), 2);
    /// assert_eq!(hits[0].score(), 20);
    /// assert_eq!(hits[0].alignment().read(), b"TTTT");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn materialize(&mut self, read_id: &str) -> Result<Vec<Hit>> {
        let Some(entry) = self.index.get(read_id) else {
            return Ok(Vec::new());
        };

        let mut hits = Vec::with_capacity(entry.offsets().len());

        for offset in entry.offsets().iter() {
            hits.push(self.read_at(*offset, read_id)?);
        }

        hits.sort_by(|a, b| b.score().cmp(&a.score()));

        Ok(hits)
    }

    /// Reads and materializes the hit at a byte offset.
    fn read_at(&mut self, offset: u64, read_id: &str) -> Result<Hit> {
        self.reader
            .inner_mut()
            .seek(SeekFrom::Start(offset))
            .map_err(Error::Io)?;

        let read = self
            .reader
            .read_line_raw(&mut self.buffer)
            .map_err(Error::Io)?;

        if read == 0 {
            return Err(Error::MissingRecord(offset));
        }

        let record = self
            .buffer
            .parse::<HitRecord>()
            .map_err(|err| Error::InvalidRecord(err, offset))?;

        if record.read_id() != read_id {
            return Err(Error::ReadIdMismatch {
                expected: read_id.to_string(),
                found: record.read_id().to_string(),
            });
        }

        let reference = self
            .references
            .get(record.reference_id())
            .ok_or_else(|| Error::UnknownReference(record.reference_id().to_string()))?;

        Hit::try_from_record(record, reference)
            .map_err(|err| Error::InvalidHit(err, read_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::index;

    /// Builds an index and a reference set for the materializer tests.
    fn setup(
        data: &[u8],
    ) -> std::result::Result<(Index, ReferenceSet), Box<dyn std::error::Error>> {
        let index = index::Builder.try_build_from(Reader::new(data))?;

        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        Ok((index, references))
    }

    #[test]
    fn test_materialize_sorts_by_descending_score()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = b"read0\tseq0\t+\t1\t4\t1\t4\t4\t30\t4\n\
                     read1\tseq0\t-\t3\t6\t1\t4\t4\t20\t4\n\
                     read0\tseq0\t+\t5\t8\t1\t4\t4\t40\t3C\n";
        let (index, references) = setup(data)?;

        let mut materializer = Materializer::new(Cursor::new(&data[..]), &index, &references);

        let hits = materializer.materialize("read0")?;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score(), 40);
        assert_eq!(hits[0].reference(), 4..8);
        assert_eq!(hits[0].alignment().read(), b"ACGC");
        assert_eq!(hits[1].score(), 30);

        let hits = materializer.materialize("read1")?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].alignment().reference(), b"GTAC");
        assert_eq!(hits[0].alignment().read(), b"GTAC");

        assert!(materializer.materialize("read2")?.is_empty());

        Ok(())
    }

    #[test]
    fn test_read_id_mismatch() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let indexed = b"read0\tseq0\t+\t1\t4\t1\t4\t4\t30\t4\n";
        let (index, references) = setup(indexed)?;

        let actual = b"read9\tseq0\t+\t1\t4\t1\t4\t4\t30\t4\n";
        let mut materializer = Materializer::new(Cursor::new(&actual[..]), &index, &references);

        let err = materializer.materialize("read0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "read id mismatch: index expected read0, hit stream has read9"
        );

        Ok(())
    }

    #[test]
    fn test_missing_record() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let indexed = b"read0\tseq0\t+\t1\t4\t1\t4\t4\t30\t4\n";
        let (index, references) = setup(indexed)?;

        let mut materializer = Materializer::new(Cursor::new(&b""[..]), &index, &references);

        let err = materializer.materialize("read0").unwrap_err();
        assert_eq!(err.to_string(), "no hit record found at offset 0");

        Ok(())
    }

    #[test]
    fn test_unknown_reference() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = b"read0\tseq9\t+\t1\t4\t1\t4\t4\t30\t4\n";
        let (index, references) = setup(data)?;

        let mut materializer = Materializer::new(Cursor::new(&data[..]), &index, &references);

        let err = materializer.materialize("read0").unwrap_err();
        assert_eq!(err.to_string(), "unknown reference: seq9");

        Ok(())
    }

    #[test]
    fn test_corrupt_record() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = b"# header\nread0\tseq0\t+\t1\t4\n";
        let (index, references) = setup(data)?;

        let mut materializer = Materializer::new(Cursor::new(&data[..]), &index, &references);

        let err = materializer.materialize("read0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "corrupt hit record at offset 9: invalid number of fields in hit record: expected \
             10 fields, found 5 fields"
        );

        Ok(())
    }
}
