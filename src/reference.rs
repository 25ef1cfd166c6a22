//! The set of reference sequences that hits are aligned against.

use std::collections::HashMap;

/// An error related to a [`ReferenceSet`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A reference sequence with the same name was already added.
    Duplicate(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Duplicate(name) => write!(f, "duplicate reference sequence name: {name}"),
        }
    }
}

impl std::error::Error for Error {}

/// A named reference sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference {
    /// The name of the reference sequence.
    name: String,

    /// The (upper-cased) bases of the reference sequence.
    sequence: Vec<u8>,
}

impl Reference {
    /// Gets the name of the reference sequence.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the bases of the reference sequence.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Gets the length of the reference sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns whether the reference sequence has no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// An ordered set of reference sequences, addressable by name.
///
/// Sequences keep the order in which they were added; every output of the
/// crate is produced in that order.
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    /// The reference sequences in insertion order.
    references: Vec<Reference>,

    /// A lookup from reference name to its index in `references`.
    lookup: HashMap<String, usize>,
}

impl ReferenceSet {
    /// Adds a reference sequence to the set.
    ///
    /// The bases are upper-cased on the way in.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"acgtNN")?;
    ///
    /// assert_eq!(references.get("seq0").unwrap().sequence(), b"ACGTNN");
    ///
    /// let err = references.add("seq0", b"ACGT").unwrap_err();
    /// assert_eq!(err.to_string(), "duplicate reference sequence name: seq0");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn add(&mut self, name: impl Into<String>, sequence: &[u8]) -> Result<(), Error> {
        let name = name.into();

        if self.lookup.contains_key(&name) {
            return Err(Error::Duplicate(name));
        }

        self.lookup.insert(name.clone(), self.references.len());
        self.references.push(Reference {
            name,
            sequence: sequence.to_ascii_uppercase(),
        });

        Ok(())
    }

    /// Gets a reference sequence by name.
    pub fn get(&self, name: &str) -> Option<&Reference> {
        self.lookup.get(name).map(|i| &self.references[*i])
    }

    /// Gets the position of a reference sequence within the set.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Returns an iterator over the reference sequences in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    /// Gets the number of reference sequences.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Returns whether the set holds no reference sequences.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("chrB", b"AC")?;
        references.add("chrA", b"GT")?;

        let names = references.iter().map(|r| r.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["chrB", "chrA"]);
        assert_eq!(references.position("chrA"), Some(1));
        assert_eq!(references.position("chrC"), None);
        assert_eq!(references.len(), 2);

        Ok(())
    }
}
