//! A hit stream reader.

use std::io;
use std::io::BufRead;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// A hit stream reader.
#[derive(Clone, Debug)]
pub struct Reader<T>(T)
where
    T: BufRead;

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a hit stream reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# comment\nread0\tseq0\t+\t1\t4\t1\t4\t4\t8\t4\n";
    /// let reader = refcons::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// The returned count is the number of bytes consumed from the underlying
    /// reader (including the stripped line ending), so it can be used to keep
    /// track of byte offsets.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"# comment\r\nread0\tseq0\t+\t1\t4\t1\t4\t4\t8\t4";
    /// let mut reader = refcons::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 11);
    /// assert_eq!(buffer, "# comment");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 26);
    /// assert_eq!(buffer, "read0\tseq0\t+\t1\t4\t1\t4\t4\t8\t4");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        read_line(self.inner_mut(), buffer)
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self(inner)
    }
}

/// Reads a line from a buffered reader, stripping the line ending.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}
