//! Differences between a consensus and its reference.

use crate::pileup::Tally;

/// The kind of a [`Change`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// A reference base was called as something that does not include it.
    Substitution,

    /// A reference base was called as deleted.
    Deletion,

    /// Bases were called as inserted before a reference position.
    InsertionBefore,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Substitution => write!(f, "substitution"),
            Kind::Deletion => write!(f, "deletion"),
            Kind::InsertionBefore => write!(f, "insertion-before"),
        }
    }
}

/// The evidence at one position: every observed value with its count.
///
/// Entries are ordered by descending count, then ascending value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Evidence(Vec<(String, u32)>);

impl Evidence {
    /// Gets the `(value, count)` entries.
    pub fn entries(&self) -> &[(String, u32)] {
        &self.0
    }

    /// Returns whether there is no evidence.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&Tally<u8>> for Evidence {
    fn from(tally: &Tally<u8>) -> Self {
        Self(
            tally
                .ranked()
                .into_iter()
                .map(|(base, count)| (char::from(*base).to_string(), count))
                .collect(),
        )
    }
}

impl From<&Tally<Vec<u8>>> for Evidence {
    fn from(tally: &Tally<Vec<u8>>) -> Self {
        Self(
            tally
                .ranked()
                .into_iter()
                .map(|(run, count)| (String::from_utf8_lossy(run).into_owned(), count))
                .collect(),
        )
    }
}

impl std::fmt::Display for Evidence {
    /// Formats the evidence as space-separated `"value"xcount` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::consensus::change::Evidence;
    /// use refcons::pileup::Tally;
    ///
    /// let mut tally = Tally::<u8>::default();
    /// tally.add(&b'T', 1);
    /// tally.add(&b'A', 3);
    ///
    /// assert_eq!(Evidence::from(&tally).to_string(), r#""A"x3 "T"x1"#);
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (value, count)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }

            write!(f, "\"{value}\"x{count}")?;
        }

        Ok(())
    }
}

/// One difference between a consensus and its reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Change {
    /// The reference name.
    reference_id: String,

    /// The 0-based reference position.
    position: usize,

    /// The kind of change.
    kind: Kind,

    /// The reference value (`-` for insertions).
    old: String,

    /// The called value (`-` for deletions).
    new: String,

    /// The evidence behind the call.
    evidence: Evidence,
}

impl Change {
    /// Creates a new [`Change`].
    pub fn new(
        reference_id: impl Into<String>,
        position: usize,
        kind: Kind,
        old: impl Into<String>,
        new: impl Into<String>,
        evidence: Evidence,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            position,
            kind,
            old: old.into(),
            new: new.into(),
            evidence,
        }
    }

    /// Gets the reference name.
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// Gets the 0-based reference position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Gets the kind of change.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Gets the reference value.
    pub fn old(&self) -> &str {
        &self.old
    }

    /// Gets the called value.
    pub fn new_value(&self) -> &str {
        &self.new
    }

    /// Gets the evidence behind the call.
    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Gets the 1-based `(start, end)` of the change as a feature interval.
    ///
    /// Substitutions and deletions cover their own position. Insertions are
    /// bracketed by the positions on either side.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::consensus::change::Change;
    /// use refcons::consensus::change::Evidence;
    /// use refcons::consensus::change::Kind;
    ///
    /// let change = Change::new("seq0", 9, Kind::Deletion, "A", "-", Evidence::default());
    /// assert_eq!(change.feature_interval(), (10, 10));
    ///
    /// let change = Change::new("seq0", 9, Kind::InsertionBefore, "-", "TT", Evidence::default());
    /// assert_eq!(change.feature_interval(), (9, 10));
    /// ```
    pub fn feature_interval(&self) -> (usize, usize) {
        match self.kind {
            Kind::InsertionBefore => (self.position, self.position + 1),
            Kind::Substitution | Kind::Deletion => (self.position + 1, self.position + 1),
        }
    }

    /// Gets a human-readable description of the change, including its
    /// evidence.
    pub fn product(&self) -> String {
        let description = match self.kind {
            Kind::Substitution => format!("Substitution: {} became {}", self.old, self.new),
            Kind::Deletion => format!("Base deleted: {}", self.old),
            Kind::InsertionBefore => format!("Insertion: .{}.", self.new),
        };

        format!("{description} ({})", self.evidence)
    }
}

impl std::fmt::Display for Change {
    /// Formats the change as a tab-separated report row with a 1-based
    /// position.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.reference_id,
            self.position + 1,
            self.kind,
            self.old,
            self.new,
            self.evidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_row() {
        let mut tally = Tally::<u8>::default();
        tally.add(&b'G', 7);
        tally.add(&b'C', 1);

        let change = Change::new(
            "seq0",
            41,
            Kind::Substitution,
            "C",
            "G",
            Evidence::from(&tally),
        );

        assert_eq!(
            change.to_string(),
            "seq0\t42\tsubstitution\tC\tG\t\"G\"x7 \"C\"x1"
        );
        assert_eq!(
            change.product(),
            "Substitution: C became G (\"G\"x7 \"C\"x1)"
        );
    }

    #[test]
    fn test_insertion_evidence_orders_ties_by_value() {
        let mut tally = Tally::<Vec<u8>>::default();
        tally.add(b"TT".as_slice(), 2);
        tally.add(b"-".as_slice(), 2);
        tally.add(b"A".as_slice(), 3);

        assert_eq!(
            Evidence::from(&tally).to_string(),
            "\"A\"x3 \"-\"x2 \"TT\"x2"
        );
    }
}
