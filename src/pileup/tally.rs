//! Frequency tables for a single reference position.

use std::borrow::Borrow;

/// A small frequency table.
///
/// Positions in a pileup rarely see more than a handful of distinct bases or
/// inserted runs, so the table is a flat list of `(key, count)` entries kept
/// in the order in which the keys were first seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally<K> {
    /// The entries.
    entries: Vec<(K, u32)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K> Tally<K>
where
    K: Eq,
{
    /// Adds `count` observations of `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::pileup::tally::Tally;
    ///
    /// let mut tally = Tally::<Vec<u8>>::default();
    /// tally.add(b"AC".as_slice(), 1);
    /// tally.add(b"AC".as_slice(), 2);
    /// tally.add(b"T".as_slice(), 1);
    ///
    /// assert_eq!(tally.get(b"AC".as_slice()), 3);
    /// assert_eq!(tally.total(), 4);
    /// ```
    pub fn add<Q>(&mut self, key: &Q, count: u32)
    where
        K: Borrow<Q>,
        Q: Eq + ToOwned<Owned = K> + ?Sized,
    {
        match self.entries.iter_mut().find(|(k, _)| <K as Borrow<Q>>::borrow(k) == key) {
            Some((_, n)) => *n += count,
            None => self.entries.push((key.to_owned(), count)),
        }
    }

    /// Gets the count for a key (zero when the key was never seen).
    pub fn get<Q>(&self, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| <K as Borrow<Q>>::borrow(k) == key)
            .map(|(_, n)| *n)
            .unwrap_or_default()
    }

    /// Gets the sum of all counts.
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Gets the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the `(key, count)` entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u32)> {
        self.entries.iter().map(|(k, n)| (k, *n))
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &Tally<K>)
    where
        K: Clone,
    {
        for (key, count) in &other.entries {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, n)) => *n += count,
                None => self.entries.push((key.clone(), *count)),
            }
        }
    }
}

impl<K> Tally<K>
where
    K: Ord,
{
    /// Returns the entries ordered by descending count, then ascending key.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::pileup::tally::Tally;
    ///
    /// let mut tally = Tally::<u8>::default();
    /// tally.add(&b'T', 5);
    /// tally.add(&b'G', 1);
    /// tally.add(&b'A', 5);
    ///
    /// let ranked = tally.ranked();
    /// assert_eq!(ranked, vec![(&b'A', 5), (&b'T', 5), (&b'G', 1)]);
    /// ```
    pub fn ranked(&self) -> Vec<(&K, u32)> {
        let mut entries = self.entries.iter().map(|(k, n)| (k, *n)).collect::<Vec<_>>();
        entries.sort_by(|(ka, na), (kb, nb)| nb.cmp(na).then_with(|| ka.cmp(kb)));
        entries
    }
}
