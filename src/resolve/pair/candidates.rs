//! Best-first enumeration of mate-pair hit combinations.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A combination of one hit from each mate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// The combined score of both hits.
    pub score: i64,

    /// The index of the first mate's hit.
    pub first: usize,

    /// The index of the second mate's hit.
    pub second: usize,
}

/// An iterator over every `(i, j)` combination of two score lists in
/// non-increasing order of combined score.
///
/// Both lists must be sorted by descending score. The frontier is expanded
/// lazily from `(0, 0)`: popping `(i, j)` pushes `(i + 1, j)` only when
/// `j == 0` and always pushes `(i, j + 1)`, so each combination is visited
/// exactly once and the full cross product is never built. Ties pop in
/// ascending `(i, j)` order. Combined scores saturate at the bounds of `i64`.
///
/// # Examples
///
/// ```
/// use refcons::resolve::pair::candidates::Candidates;
///
/// let first = [10, 5];
/// let second = [7, 6, 1];
///
/// let order = Candidates::new(&first, &second)
///     .map(|c| (c.score, c.first, c.second))
///     .collect::<Vec<_>>();
///
/// assert_eq!(
///     order,
///     vec![
///         (17, 0, 0),
///         (16, 0, 1),
///         (12, 1, 0),
///         (11, 0, 2),
///         (11, 1, 1),
///         (6, 1, 2)
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct Candidates<'a> {
    /// The first mate's scores.
    first: &'a [i64],

    /// The second mate's scores.
    second: &'a [i64],

    /// The frontier, keyed by combined score and then by reversed indexes.
    heap: BinaryHeap<(i64, Reverse<usize>, Reverse<usize>)>,
}

impl<'a> Candidates<'a> {
    /// Creates a new [`Candidates`] iterator.
    pub fn new(first: &'a [i64], second: &'a [i64]) -> Self {
        let mut candidates = Self {
            first,
            second,
            heap: BinaryHeap::new(),
        };

        if !first.is_empty() && !second.is_empty() {
            candidates.push(0, 0);
        }

        candidates
    }

    /// Pushes `(i, j)` onto the frontier.
    fn push(&mut self, i: usize, j: usize) {
        let score = self.first[i].saturating_add(self.second[j]);
        self.heap.push((score, Reverse(i), Reverse(j)));
    }
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        let (score, Reverse(i), Reverse(j)) = self.heap.pop()?;

        if j == 0 && i + 1 < self.first.len() {
            self.push(i + 1, j);
        }

        if j + 1 < self.second.len() {
            self.push(i, j + 1);
        }

        Some(Candidate {
            score,
            first: i,
            second: j,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng as _;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_empty_list_yields_nothing() {
        assert_eq!(Candidates::new(&[], &[3, 2]).count(), 0);
        assert_eq!(Candidates::new(&[3, 2], &[]).count(), 0);
    }

    #[test]
    fn test_extreme_scores_saturate() {
        let order = Candidates::new(&[i64::MAX, 0], &[i64::MAX])
            .map(|c| (c.score, c.first, c.second))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(i64::MAX, 0, 0), (i64::MAX, 1, 0)]);

        let order = Candidates::new(&[i64::MIN], &[i64::MIN, -1])
            .map(|c| (c.score, c.first, c.second))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(i64::MIN, 0, 0), (i64::MIN, 0, 1)]);
    }

    #[test]
    fn test_every_combination_once_in_order() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let mut first = (0..rng.gen_range(1..8))
                .map(|_| rng.gen_range(0..100))
                .collect::<Vec<i64>>();
            let mut second = (0..rng.gen_range(1..8))
                .map(|_| rng.gen_range(0..100))
                .collect::<Vec<i64>>();
            first.sort_by(|a, b| b.cmp(a));
            second.sort_by(|a, b| b.cmp(a));

            let candidates = Candidates::new(&first, &second).collect::<Vec<_>>();

            assert_eq!(candidates.len(), first.len() * second.len());
            assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));

            let mut seen = candidates
                .iter()
                .map(|c| (c.first, c.second))
                .collect::<Vec<_>>();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), candidates.len());

            for c in &candidates {
                assert_eq!(c.score, first[c.first] + second[c.second]);
            }
        }
    }
}
