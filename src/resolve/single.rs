//! Resolution of a lone read's hits.

use std::io::BufRead;
use std::io::Seek;

use tracing::debug;

use crate::config::Config;
use crate::hit::Hit;
use crate::index::Materializer;
use crate::index::materializer;
use crate::pileup::Pileups;
use crate::resolve::PROGRESS_INTERVAL;

/// How a read's hits were folded into the pileups.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The read had no hits.
    Unmapped,

    /// A single hit qualified and was counted in full.
    Unambiguous,

    /// The given number of hits qualified; each added only ambiguous depth.
    Ambiguous(usize),
}

/// Counts of how the reads of a pass were resolved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The number of reads processed.
    pub reads: usize,

    /// The number of reads with exactly one qualifying hit.
    pub unambiguous: usize,

    /// The number of reads with several qualifying hits.
    pub ambiguous: usize,
}

/// Gets the number of hits that qualify as tied with the best one.
///
/// `scores` must be sorted in descending order. A hit qualifies when its score
/// is at least the best score scaled by `infidelity`.
///
/// # Examples
///
/// ```
/// use refcons::resolve::single::qualifying;
///
/// assert_eq!(qualifying(&[100, 100, 50], 1.0), 2);
/// assert_eq!(qualifying(&[100, 90, 50], 0.9), 2);
/// assert_eq!(qualifying(&[100, 50], 1.0), 1);
/// assert_eq!(qualifying(&[], 1.0), 0);
/// ```
pub fn qualifying(scores: &[i64], infidelity: f64) -> usize {
    let Some(best) = scores.first() else {
        return 0;
    };

    let threshold = *best as f64 * infidelity;

    1 + scores[1..]
        .iter()
        .take_while(|score| **score as f64 >= threshold)
        .count()
}

/// Resolves the hits of lone reads.
#[derive(Clone, Debug)]
pub struct Resolver {
    /// The runner-up score ratio still treated as a tie.
    infidelity: f64,

    /// The number of alignment columns ignored at each end of a hit.
    trim: usize,
}

impl Resolver {
    /// Creates a new [`Resolver`].
    pub fn new(infidelity: f64, trim: usize) -> Self {
        Self { infidelity, trim }
    }

    /// Folds one read's hits, sorted by descending score, into the pileups.
    ///
    /// When exactly one hit qualifies, it is counted in full. Every
    /// qualifying hit adds a `1 / n` share of ambiguous depth, so each read
    /// contributes exactly one unit of ambiguous depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::hit::Hit;
    /// use refcons::pileup::Pileups;
    /// use refcons::record::HitRecord;
    /// use refcons::reference::ReferenceSet;
    /// use refcons::resolve::single::Resolution;
    /// use refcons::resolve::single::Resolver;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGTACGT")?;
    /// let reference = references.get("seq0").unwrap();
    ///
    /// let hits = [
    ///     "r\tseq0\t+\t1\t4\t1\t4\t4\t100\t4",
    ///     "r\tseq0\t+\t5\t8\t1\t4\t4\t100\t4",
    ///     "r\tseq0\t+\t3\t6\t1\t4\t4\t50\t1C2",
    /// ]
    /// .into_iter()
    /// .map(|line| -> Result<Hit, Box<dyn std::error::Error>> {
    ///     Ok(Hit::try_from_record(line.parse::<HitRecord>()?, reference)?)
    /// })
    /// .collect::<Result<Vec<_>, _>>()?;
    ///
    /// let mut pileups = Pileups::new(&references);
    /// let resolution = Resolver::new(1.0, 0).resolve(&hits, &mut pileups);
    ///
    /// assert_eq!(resolution, Resolution::Ambiguous(2));
    ///
    /// let pileup = pileups.get("seq0").unwrap();
    /// assert_eq!(pileup.ambiguous_depth(), &[0.5; 8]);
    /// assert_eq!(pileup.depth(), &[0; 8]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn resolve(&self, hits: &[Hit], pileups: &mut Pileups) -> Resolution {
        let scores = hits.iter().map(Hit::score).collect::<Vec<_>>();
        let n = qualifying(&scores, self.infidelity);

        if n == 0 {
            return Resolution::Unmapped;
        }

        if n == 1 {
            pileups.add_unambiguous(&hits[0], self.trim);
        }

        for hit in &hits[..n] {
            pileups.add_ambiguous(hit, n);
        }

        match n {
            1 => Resolution::Unambiguous,
            n => Resolution::Ambiguous(n),
        }
    }

    /// Materializes and resolves every listed read.
    pub fn run<'a, T, I>(
        &self,
        materializer: &mut Materializer<'_, T>,
        read_ids: I,
        pileups: &mut Pileups,
    ) -> Result<Summary, materializer::Error>
    where
        T: BufRead + Seek,
        I: IntoIterator<Item = &'a str>,
    {
        let mut summary = Summary::default();

        for read_id in read_ids {
            if summary.reads % PROGRESS_INTERVAL == 0 && summary.reads > 0 {
                debug!("resolved {} reads", summary.reads);
            }

            let hits = materializer.materialize(read_id)?;
            summary.reads += 1;

            match self.resolve(&hits, pileups) {
                Resolution::Unmapped => {}
                Resolution::Unambiguous => summary.unambiguous += 1,
                Resolution::Ambiguous(_) => summary.ambiguous += 1,
            }
        }

        debug!(
            "resolved {} reads ({} unambiguous, {} ambiguous)",
            summary.reads, summary.unambiguous, summary.ambiguous
        );

        Ok(summary)
    }
}

impl From<&Config> for Resolver {
    fn from(config: &Config) -> Self {
        Self::new(config.infidelity(), config.trim())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::Reader;
    use crate::hit::tests::hit;
    use crate::index;
    use crate::reference::ReferenceSet;

    /// Creates a reference set with a single reference.
    fn references() -> ReferenceSet {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGTAA").unwrap();
        references
    }

    #[test]
    fn test_unambiguous_hit_is_counted_in_full() {
        let references = references();
        let mut pileups = Pileups::new(&references);

        let hits = vec![
            hit(&references, "r\tseq0\t+\t1\t4\t1\t4\t4\t100\t3A"),
            hit(&references, "r\tseq0\t+\t5\t8\t1\t4\t4\t80\t4"),
        ];

        let resolution = Resolver::new(1.0, 0).resolve(&hits, &mut pileups);
        assert_eq!(resolution, Resolution::Unambiguous);

        let pileup = pileups.get("seq0").unwrap();
        assert_eq!(pileup.depth(), &[1, 1, 1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(pileup.bases(3).get(&b'A'), 1);
        assert_eq!(
            pileup.ambiguous_depth(),
            &[1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_infidelity_widens_the_tie() {
        let references = references();
        let mut pileups = Pileups::new(&references);

        let hits = vec![
            hit(&references, "r\tseq0\t+\t1\t4\t1\t4\t4\t100\t4"),
            hit(&references, "r\tseq0\t+\t5\t8\t1\t4\t4\t80\t4"),
        ];

        let resolution = Resolver::new(0.8, 0).resolve(&hits, &mut pileups);
        assert_eq!(resolution, Resolution::Ambiguous(2));
        assert!(pileups.get("seq0").unwrap().depth().iter().all(|d| *d == 0));
    }

    #[test]
    fn test_no_hits() {
        let references = references();
        let mut pileups = Pileups::new(&references);
        let resolution = Resolver::new(1.0, 0).resolve(&[], &mut pileups);
        assert_eq!(resolution, Resolution::Unmapped);
    }

    #[test]
    fn test_run_over_an_index() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"a\tseq0\t+\t1\t4\t1\t4\t4\t40\t4\n\
                     b\tseq0\t+\t1\t4\t1\t4\t4\t40\t4\n\
                     b\tseq0\t+\t5\t8\t1\t4\t4\t40\t4\n";
        let references = references();
        let index = index::Builder.try_build_from(Reader::new(&data[..]))?;
        let mut materializer = Materializer::new(Cursor::new(&data[..]), &index, &references);
        let mut pileups = Pileups::new(&references);

        let summary =
            Resolver::new(1.0, 0).run(&mut materializer, index.read_ids(), &mut pileups)?;

        assert_eq!(
            summary,
            Summary {
                reads: 2,
                unambiguous: 1,
                ambiguous: 1
            }
        );

        let pileup = pileups.get("seq0").unwrap();
        assert_eq!(pileup.depth()[..4], [1, 1, 1, 1]);
        assert_eq!(pileup.ambiguous_depth()[..8], [1.5, 1.5, 1.5, 1.5, 0.5, 0.5, 0.5, 0.5]);

        Ok(())
    }
}
