//! An out-of-core index of a hit stream.
//!
//! Hit streams are frequently far larger than memory. Rather than holding
//! parsed records, an [`Index`] stores, for every read id, the byte offsets of
//! that read's hit lines. Using the index is a two-phase protocol:
//!
//! 1. A [`Builder`] makes a single forward scan over the stream and produces
//!    an immutable [`Index`].
//! 2. A [`Materializer`] seeks to the stored offsets on demand and turns the
//!    lines found there into [`Hit`](crate::hit::Hit)s.

use std::collections::HashMap;

use nonempty::NonEmpty;

pub mod builder;
pub mod materializer;

pub use builder::Builder;
pub use materializer::Materializer;

/// The byte offsets of every hit line for one read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// The read id.
    read_id: String,

    /// The byte offsets of the read's hit lines, in stream order.
    offsets: NonEmpty<u64>,
}

impl Entry {
    /// Gets the read id.
    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    /// Gets the byte offsets of the read's hit lines.
    pub fn offsets(&self) -> &NonEmpty<u64> {
        &self.offsets
    }
}

/// An immutable map from read id to the byte offsets of its hit lines.
///
/// Entries are kept in the order in which their read ids first appear in the
/// stream.
#[derive(Clone, Debug, Default)]
pub struct Index {
    /// The entries, in order of first appearance.
    entries: Vec<Entry>,

    /// A lookup from read id to its position within `entries`.
    lookup: HashMap<String, usize>,
}

impl Index {
    /// Records a hit line for `read_id` found at `offset`.
    fn push(&mut self, read_id: &str, offset: u64) {
        match self.lookup.get(read_id) {
            Some(i) => self.entries[*i].offsets.push(offset),
            None => {
                self.lookup.insert(read_id.to_string(), self.entries.len());
                self.entries.push(Entry {
                    read_id: read_id.to_string(),
                    offsets: NonEmpty::new(offset),
                });
            }
        }
    }

    /// Gets the entry for a read id.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::index;
    ///
    /// let data = b"read0\tseq0\nread1\tseq0\nread0\tseq1\n";
    /// let reader = refcons::Reader::new(&data[..]);
    /// let index = index::Builder.try_build_from(reader)?;
    ///
    /// let entry = index.get("read0").unwrap();
    /// assert_eq!(entry.offsets().iter().copied().collect::<Vec<_>>(), vec![0, 22]);
    /// assert!(index.get("read2").is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn get(&self, read_id: &str) -> Option<&Entry> {
        self.lookup.get(read_id).map(|i| &self.entries[*i])
    }

    /// Returns whether the index has any hit lines for a read id.
    pub fn contains(&self, read_id: &str) -> bool {
        self.lookup.contains_key(read_id)
    }

    /// Returns an iterator over the entries in order of first appearance.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Returns an iterator over the read ids in order of first appearance.
    pub fn read_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.read_id())
    }

    /// Gets the number of distinct reads in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_first_appearance_order() {
        let mut index = Index::default();
        index.push("b", 0);
        index.push("a", 10);
        index.push("b", 20);

        assert_eq!(index.read_ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(index.len(), 2);

        let offsets = index.get("b").unwrap().offsets();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets.first(), &0);
        assert_eq!(offsets.last(), &20);
    }
}
