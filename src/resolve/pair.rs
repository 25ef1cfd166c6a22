//! Resolution of mate pairs.
//!
//! Mates are recognized by read id: a read ending with the first suffix is
//! paired with the read that has the same stem and the second suffix. For each
//! pair, combinations of one hit per mate are visited best first (see
//! [`candidates`]) and accepted when both hits land on the same reference, in
//! the expected relative orientation, close enough together. Reads whose mate
//! has no hits (orphans) and reads without either suffix (unpaired) are
//! resolved on their own afterwards.

use std::io::BufRead;
use std::io::Seek;

use omics::coordinate::Strand;
use tracing::debug;
use tracing::warn;

use crate::config::Config;
use crate::config::Pairing;
use crate::hit::Hit;
use crate::index::Index;
use crate::index::Materializer;
use crate::index::materializer;
use crate::pileup::Pileups;
use crate::resolve::PROGRESS_INTERVAL;
use crate::resolve::single;

pub mod candidates;

pub use candidates::Candidates;

/// Counts gathered while resolving mate pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// The largest allowed separation between mates.
    max_pair_sep: i64,

    /// The number of pairs where both mates hit something.
    both_hit: usize,

    /// The number of pairs with at least one validly oriented and spaced
    /// placement.
    valid: usize,

    /// The separations of unambiguously placed pairs.
    separations: Vec<i64>,

    /// The number of mates whose partner had no hits.
    orphans: usize,

    /// The number of reads without either mate suffix.
    unpaired: usize,
}

impl Stats {
    /// Gets the largest allowed separation between mates.
    pub fn max_pair_sep(&self) -> i64 {
        self.max_pair_sep
    }

    /// Gets the number of pairs where both mates hit something.
    pub fn both_hit(&self) -> usize {
        self.both_hit
    }

    /// Gets the number of pairs with at least one validly oriented and
    /// spaced placement.
    pub fn valid(&self) -> usize {
        self.valid
    }

    /// Gets the number of pairs with exactly one valid placement.
    pub fn unambiguous(&self) -> usize {
        self.separations.len()
    }

    /// Gets the median separation of unambiguously placed pairs.
    ///
    /// With an even number of pairs, the two middle separations are averaged
    /// and rounded down.
    pub fn median_separation(&self) -> Option<i64> {
        if self.separations.is_empty() {
            return None;
        }

        let mut separations = self.separations.clone();
        separations.sort_unstable();

        let mid = separations.len() / 2;
        match separations.len() % 2 {
            0 => Some((separations[mid - 1] + separations[mid]) / 2),
            _ => Some(separations[mid]),
        }
    }

    /// Gets the number of mates whose partner had no hits.
    pub fn orphans(&self) -> usize {
        self.orphans
    }

    /// Gets the number of reads without either mate suffix.
    pub fn unpaired(&self) -> usize {
        self.unpaired
    }
}

/// The placement of one mate of a [`WeirdPair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MateEnd {
    /// The reference the mate hit.
    reference_id: String,

    /// The orientation of the hit.
    strand: Strand,

    /// The mapped end of the hit (see [`Hit::mapped_end()`]).
    position: usize,
}

impl MateEnd {
    /// Gets the reference the mate hit.
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// Gets the orientation of the hit.
    pub fn strand(&self) -> &Strand {
        &self.strand
    }

    /// Gets the mapped end of the hit (see [`Hit::mapped_end()`]).
    pub fn position(&self) -> usize {
        self.position
    }
}

impl From<&Hit> for MateEnd {
    fn from(hit: &Hit) -> Self {
        Self {
            reference_id: hit.reference_id().to_string(),
            strand: hit.strand().clone(),
            position: hit.mapped_end(),
        }
    }
}

/// A pair whose mates each have a clear best hit, but whose best hits are not
/// placed like mates (different references, wrong orientation, or too far
/// apart). These hint at structural rearrangements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeirdPair {
    /// The first mate.
    left: MateEnd,

    /// The second mate.
    right: MateEnd,
}

impl WeirdPair {
    /// Creates a new [`WeirdPair`].
    pub fn new(left: MateEnd, right: MateEnd) -> Self {
        Self { left, right }
    }

    /// Gets the first mate.
    pub fn left(&self) -> &MateEnd {
        &self.left
    }

    /// Gets the second mate.
    pub fn right(&self) -> &MateEnd {
        &self.right
    }
}

/// How a mate pair's hits were folded into the pileups.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Exactly one placement was valid; both mates were counted in full.
    Unambiguous {
        /// The separation of the mates.
        separation: i64,
    },

    /// The given number of placements tied; each added only ambiguous depth.
    Ambiguous(usize),

    /// No placement was valid, though each mate had a clear best hit.
    Weird(WeirdPair),

    /// No placement was valid.
    Discordant,
}

/// Everything a paired pass reports besides the pileups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    /// The pair statistics.
    pub stats: Stats,

    /// The weird pairs, in read order.
    pub weird_pairs: Vec<WeirdPair>,
}

/// The role a read id plays in pairing.
#[derive(Debug, PartialEq, Eq)]
enum Role {
    /// The first mate of a pair; holds the second mate's read id.
    First(String),

    /// The second mate of a pair whose first mate is also present. The pair is
    /// handled from the first mate.
    Second,

    /// A mate whose partner has no hits.
    Orphan,

    /// A read id without either suffix.
    Unpaired,
}

/// Determines the role a read id plays given the pairing and the reads that
/// have hits.
fn classify(read_id: &str, pairing: &Pairing, index: &Index) -> Role {
    if let Some(stem) = read_id.strip_suffix(pairing.suffix2()) {
        let mate = format!("{stem}{}", pairing.suffix1());
        return match index.contains(&mate) {
            true => Role::Second,
            false => Role::Orphan,
        };
    }

    match read_id.strip_suffix(pairing.suffix1()) {
        Some(stem) => {
            let mate = format!("{stem}{}", pairing.suffix2());
            match index.contains(&mate) {
                true => Role::First(mate),
                false => Role::Orphan,
            }
        }
        None => Role::Unpaired,
    }
}

/// Returns whether the best of a mate's hits clearly beats its runner-up.
fn has_clear_best(hits: &[Hit], infidelity: f64) -> bool {
    match hits {
        [] => false,
        [_] => true,
        [best, runner_up, ..] => best.score() as f64 * infidelity > runner_up.score() as f64,
    }
}

/// Resolves mate pairs.
#[derive(Clone, Debug)]
pub struct Resolver {
    /// The pairing.
    pairing: Pairing,

    /// The runner-up score ratio still treated as a tie.
    infidelity: f64,

    /// The number of alignment columns ignored at each end of a hit.
    trim: usize,
}

impl Resolver {
    /// Creates a new [`Resolver`].
    pub fn new(pairing: Pairing, infidelity: f64, trim: usize) -> Self {
        Self {
            pairing,
            infidelity,
            trim,
        }
    }

    /// Creates a new [`Resolver`] from a [`Config`], if it has a pairing.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .pairing()
            .map(|pairing| Self::new(pairing.clone(), config.infidelity(), config.trim()))
    }

    /// Gets the separation of two hits if they are placed like mates.
    ///
    /// The hits must be on the same reference, in the configured relative
    /// orientation, and separated by between zero and the maximum separation.
    /// Separation is measured from the end of the first mate to the start of
    /// the second when the first mate is forward, and from the end of the
    /// second mate to the start of the first otherwise.
    pub fn separation(&self, first: &Hit, second: &Hit) -> Option<i64> {
        if first.reference_id() != second.reference_id() {
            return None;
        }

        if (first.is_forward() == second.is_forward()) != self.pairing.same_direction() {
            return None;
        }

        let separation = if first.is_forward() {
            second.reference().start as i64 - first.reference().end as i64
        } else {
            first.reference().start as i64 - second.reference().end as i64
        };

        (0..=self.pairing.max_pair_sep())
            .contains(&separation)
            .then_some(separation)
    }

    /// Folds one mate pair's hits, each list sorted by descending score, into
    /// the pileups.
    ///
    /// Combinations are visited in order of combined score. Once a valid
    /// placement is found, visiting stops at the first combination scoring
    /// below the best valid one scaled by the infidelity. A single valid
    /// placement counts both mates in full; every valid placement adds a
    /// `1 / n` share of ambiguous depth for each mate.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::config::Pairing;
    /// use refcons::hit::Hit;
    /// use refcons::pileup::Pileups;
    /// use refcons::record::HitRecord;
    /// use refcons::reference::ReferenceSet;
    /// use refcons::resolve::pair::Outcome;
    /// use refcons::resolve::pair::Resolver;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", &[b'A'; 1000])?;
    /// let reference = references.get("seq0").unwrap();
    ///
    /// let hit = |line: &str| -> Result<Hit, Box<dyn std::error::Error>> {
    ///     Ok(Hit::try_from_record(line.parse::<HitRecord>()?, reference)?)
    /// };
    ///
    /// let first = vec![hit("r/1\tseq0\t+\t1\t50\t1\t50\t50\t50\t50")?];
    /// let near = vec![hit("r/2\tseq0\t-\t351\t400\t1\t50\t50\t50\t50")?];
    /// let far = vec![hit("r/2\tseq0\t-\t651\t700\t1\t50\t50\t50\t50")?];
    ///
    /// let resolver = Resolver::new(Pairing::illumina(500), 1.0, 0);
    /// let mut pileups = Pileups::new(&references);
    ///
    /// assert_eq!(
    ///     resolver.resolve(&first, &near, &mut pileups),
    ///     Outcome::Unambiguous { separation: 300 }
    /// );
    /// assert!(matches!(
    ///     resolver.resolve(&first, &far, &mut pileups),
    ///     Outcome::Weird(_)
    /// ));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn resolve(&self, first: &[Hit], second: &[Hit], pileups: &mut Pileups) -> Outcome {
        let first_scores = first.iter().map(Hit::score).collect::<Vec<_>>();
        let second_scores = second.iter().map(Hit::score).collect::<Vec<_>>();

        let mut accepted: Vec<(i64, usize, usize, i64)> = Vec::new();

        for candidate in Candidates::new(&first_scores, &second_scores) {
            if let Some((best, ..)) = accepted.first() {
                if (candidate.score as f64) < *best as f64 * self.infidelity {
                    break;
                }
            }

            if let Some(separation) =
                self.separation(&first[candidate.first], &second[candidate.second])
            {
                accepted.push((
                    candidate.score,
                    candidate.first,
                    candidate.second,
                    separation,
                ));
            }
        }

        match accepted.as_slice() {
            [] => {
                if has_clear_best(first, self.infidelity) && has_clear_best(second, self.infidelity)
                {
                    Outcome::Weird(WeirdPair {
                        left: MateEnd::from(&first[0]),
                        right: MateEnd::from(&second[0]),
                    })
                } else {
                    Outcome::Discordant
                }
            }
            [(_, i, j, separation)] => {
                pileups.add_unambiguous(&first[*i], self.trim);
                pileups.add_unambiguous(&second[*j], self.trim);
                pileups.add_ambiguous(&first[*i], 1);
                pileups.add_ambiguous(&second[*j], 1);

                Outcome::Unambiguous {
                    separation: *separation,
                }
            }
            placements => {
                let n = placements.len();

                for (_, i, j, _) in placements {
                    pileups.add_ambiguous(&first[*i], n);
                    pileups.add_ambiguous(&second[*j], n);
                }

                Outcome::Ambiguous(n)
            }
        }
    }

    /// Resolves every read in the materializer's index as part of a pair
    /// where possible, then resolves orphans and unpaired reads on their own.
    pub fn run<T>(
        &self,
        materializer: &mut Materializer<'_, T>,
        pileups: &mut Pileups,
    ) -> Result<Report, materializer::Error>
    where
        T: BufRead + Seek,
    {
        let index = materializer.index();

        let mut report = Report {
            stats: Stats {
                max_pair_sep: self.pairing.max_pair_sep(),
                ..Default::default()
            },
            weird_pairs: Vec::new(),
        };

        let mut orphans = Vec::new();
        let mut unpaired = Vec::new();

        for (i, read_id) in index.read_ids().enumerate() {
            if i % PROGRESS_INTERVAL == 0 && i > 0 {
                debug!("resolved reads as pairs: {i} of {}", index.len());
            }

            let mate = match classify(read_id, &self.pairing, index) {
                Role::First(mate) => mate,
                Role::Second => continue,
                Role::Orphan => {
                    orphans.push(read_id);
                    continue;
                }
                Role::Unpaired => {
                    unpaired.push(read_id);
                    continue;
                }
            };

            report.stats.both_hit += 1;

            let first = materializer.materialize(read_id)?;
            let second = materializer.materialize(&mate)?;

            match self.resolve(&first, &second, pileups) {
                Outcome::Unambiguous { separation } => {
                    report.stats.valid += 1;
                    report.stats.separations.push(separation);
                }
                Outcome::Ambiguous(_) => report.stats.valid += 1,
                Outcome::Weird(pair) => {
                    debug!(
                        "weird pair: {read_id} on {} ({}) and {mate} on {} ({})",
                        pair.left().reference_id(),
                        pair.left().strand(),
                        pair.right().reference_id(),
                        pair.right().strand(),
                    );
                    report.weird_pairs.push(pair);
                }
                Outcome::Discordant => {}
            }
        }

        report.stats.orphans = orphans.len();
        report.stats.unpaired = unpaired.len();

        if !orphans.is_empty() {
            warn!(
                "{} reads have no hits to their mate and will be treated as single reads",
                orphans.len()
            );
        }

        single::Resolver::new(self.infidelity, self.trim).run(
            materializer,
            orphans.into_iter().chain(unpaired),
            pileups,
        )?;

        Ok(report)
    }
}
