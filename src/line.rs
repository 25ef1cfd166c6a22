//! Lines within a hit stream.

use crate::record::hit;

/// The prefix for a comment line.
pub const COMMENT_PREFIX: &str = "#";

/// Extracts the read id from a raw hit line without parsing the rest of it.
///
/// The read id is the first whitespace-delimited token before the first tab.
/// Comment and blank lines have no read id.
///
/// # Examples
///
/// ```
/// use refcons::line::read_id;
///
/// assert_eq!(read_id("read0/1 extra\tseq0\t+"), Some("read0/1"));
/// assert_eq!(read_id("# a comment"), None);
/// assert_eq!(read_id("   "), None);
/// ```
pub fn read_id(line: &str) -> Option<&str> {
    if line.starts_with(COMMENT_PREFIX) {
        return None;
    }

    line.split(hit::DELIMITER).next()?.split_whitespace().next()
}
