//! A builder for an [`Index`].

use std::io;
use std::io::BufRead;

use tracing::debug;

use crate::index::Index;
use crate::line;
use crate::reader;

/// The number of hit lines between progress messages.
const PROGRESS_INTERVAL: usize = 10_000;

/// An error related to building an [`Index`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for an [`Index`].
#[derive(Debug, Default)]
pub struct Builder;

impl Builder {
    /// Builds an [`Index`] with a single forward scan of a hit stream.
    ///
    /// Only the read id of each line is extracted; the rest of the line is
    /// left unparsed until the hit is materialized. Comment and blank lines
    /// are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# comment\nread0\tseq0\t+\t1\t4\t1\t4\t4\t8\t4\n";
    /// let reader = refcons::Reader::new(&data[..]);
    ///
    /// let index = refcons::index::Builder.try_build_from(reader)?;
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index.get("read0").unwrap().offsets().first(), &10);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build_from<T>(&self, mut reader: reader::Reader<T>) -> Result<Index>
    where
        T: BufRead,
    {
        let mut index = Index::default();
        let mut buffer = String::new();
        let mut offset = 0u64;
        let mut hits = 0usize;

        loop {
            let read = reader.read_line_raw(&mut buffer).map_err(Error::Io)?;
            if read == 0 {
                break;
            }

            if let Some(read_id) = line::read_id(&buffer) {
                index.push(read_id, offset);
                hits += 1;

                if hits % PROGRESS_INTERVAL == 0 {
                    debug!("indexed {hits} hits from {} reads", index.len());
                }
            }

            offset += read as u64;
        }

        debug!("indexed {hits} hits from {} reads", index.len());

        Ok(index)
    }
}
