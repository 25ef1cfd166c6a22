//! Consensus calling from accumulated evidence.
//!
//! For every reference position, the [`Caller`] first decides whether bases
//! were inserted before the position and then calls the position itself.
//! Inserted runs only need to reach the minimum depth; base calls also need
//! to reach the minimum purity.

use tracing::debug;

use crate::alignment::Alignment;
use crate::alignment::GAP;
use crate::config::Config;
use crate::pileup::Pileup;
use crate::pileup::Tally;
use crate::projection::Projection;
use crate::reference::Reference;

pub mod ambiguity;
pub mod change;

pub use change::Change;
pub use change::Evidence;
pub use change::Kind;

/// The symbol written for a position without a call.
pub const NO_CALL: u8 = b'N';

/// The insertion candidate that stands for "nothing was inserted".
const NO_INSERTION: &[u8] = b"-";

/// The number of positions between progress messages.
const PROGRESS_INTERVAL: usize = 10_000;

/// Calls the top candidate if it alone reaches both thresholds.
///
/// Candidates are ranked by descending count, then ascending key.
///
/// # Examples
///
/// ```
/// use refcons::consensus::call_strict;
/// use refcons::pileup::Tally;
///
/// let mut tally = Tally::<u8>::default();
/// tally.add(&b'T', 5);
/// tally.add(&b'A', 5);
///
/// assert_eq!(call_strict(&tally, 5, 0.5), Some(&b'A'));
/// assert_eq!(call_strict(&tally, 6, 0.5), None);
/// assert_eq!(call_strict(&tally, 5, 0.6), None);
/// ```
pub fn call_strict<K>(tally: &Tally<K>, min_depth: u32, min_purity: f64) -> Option<&K>
where
    K: Ord,
{
    let total = tally.total();
    let (key, count) = tally.ranked().into_iter().next()?;

    if count < min_depth || (count as f64) < min_purity * total as f64 {
        return None;
    }

    Some(key)
}

/// Calls a base, using an ambiguity code when no single base is pure enough.
///
/// Ranked candidates are taken until together they reach both thresholds.
/// Every further candidate with the same count as the last one taken is also
/// taken, so ties are never split. The taken set is then encoded with
/// [`ambiguity::encode()`].
///
/// # Examples
///
/// ```
/// use refcons::consensus::call_ambiguous;
/// use refcons::pileup::Tally;
///
/// let mut tally = Tally::<u8>::default();
/// tally.add(&b'A', 5);
/// tally.add(&b'T', 5);
/// assert_eq!(call_ambiguous(&tally, 5, 0.5), Some(b'W'));
///
/// let mut tally = Tally::<u8>::default();
/// tally.add(&b'A', 6);
/// tally.add(&b'T', 4);
/// assert_eq!(call_ambiguous(&tally, 5, 0.5), Some(b'A'));
/// ```
pub fn call_ambiguous(tally: &Tally<u8>, min_depth: u32, min_purity: f64) -> Option<u8> {
    let total = tally.total() as f64;

    let mut running = 0u32;
    let mut bases = Vec::new();
    let mut cutoff = None;

    for (base, count) in tally.ranked() {
        if cutoff.is_some_and(|cutoff| count < cutoff) {
            break;
        }

        running += count;
        bases.push(*base);

        if running >= min_depth && running as f64 >= min_purity * total {
            cutoff = Some(count);
        }
    }

    cutoff?;

    bases.sort_unstable();
    ambiguity::encode(&bases)
}

/// Calls the inserted run from insertion candidates.
///
/// The top candidate only needs to reach `min_depth`. A run that ties with
/// the no-insertion count is never called.
fn call_inserted_run(candidates: &Tally<Vec<u8>>, min_depth: u32) -> Option<Vec<u8>> {
    let (run, count) = candidates.ranked().into_iter().next()?;

    if count < min_depth || candidates.get(NO_INSERTION) >= count {
        return None;
    }

    Some(run.clone())
}

/// The consensus of one reference sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Consensus {
    /// The reference name.
    name: String,

    /// The called sequence, including insertions.
    sequence: Vec<u8>,

    /// The called sequence with uncalled positions as lowercase reference
    /// bases.
    masked: Vec<u8>,

    /// The changes relative to the reference, in position order.
    changes: Vec<Change>,

    /// Whether each reference position was called as a definite base or a
    /// deletion.
    has_consensus: Vec<bool>,

    /// The reference aligned to the called sequence.
    alignment: Alignment,

    /// The insertion candidates before each position.
    insertion_evidence: Vec<Evidence>,

    /// The base evidence at each position.
    substitution_evidence: Vec<Evidence>,

    /// The number of positions whose evidence failed the calling thresholds.
    no_calls: usize,
}

impl Consensus {
    /// Gets the reference name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the called sequence.
    ///
    /// Uncalled positions are [`NO_CALL`], deleted positions are omitted and
    /// called insertions are included.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Gets the called sequence with uncalled positions replaced by the
    /// lowercase reference base.
    pub fn masked(&self) -> &[u8] {
        &self.masked
    }

    /// Gets the changes relative to the reference, in position order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Gets whether each reference position was called as one of `ACGT` or
    /// as a deletion.
    pub fn has_consensus(&self) -> &[bool] {
        &self.has_consensus
    }

    /// Gets the reference (first track) aligned to the called sequence
    /// (second track).
    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    /// Builds a [`Projection`] of reference coordinates onto the called
    /// sequence.
    pub fn projection(&self) -> Projection {
        Projection::new(&self.alignment)
    }

    /// Gets the insertion candidates (including the no-insertion count)
    /// before each position.
    pub fn insertion_evidence(&self) -> &[Evidence] {
        &self.insertion_evidence
    }

    /// Gets the base evidence at each position.
    pub fn substitution_evidence(&self) -> &[Evidence] {
        &self.substitution_evidence
    }

    /// Gets the number of positions whose evidence failed the calling
    /// thresholds (written as [`NO_CALL`]).
    pub fn no_calls(&self) -> usize {
        self.no_calls
    }

    /// Gets the reference with every position lacking a consensus replaced by
    /// `n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::consensus::Caller;
    /// use refcons::pileup::Pileup;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGT")?;
    /// let reference = references.get("seq0").unwrap();
    ///
    /// let consensus = Caller::default().call(reference, &Pileup::new(reference));
    /// assert_eq!(consensus.reference_having_consensus(reference), b"nnnn");
    /// assert_eq!(consensus.sequence(), b"NNNN");
    /// assert_eq!(consensus.masked(), b"acgt");
    /// assert_eq!(consensus.no_calls(), 4);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn reference_having_consensus(&self, reference: &Reference) -> Vec<u8> {
        reference
            .sequence()
            .iter()
            .zip(&self.has_consensus)
            .map(|(base, has)| if *has { *base } else { b'n' })
            .collect()
    }
}

/// Calls a [`Consensus`] from a [`Pileup`].
#[derive(Clone, Debug)]
pub struct Caller {
    /// The minimum supporting count for any call.
    min_depth: u32,

    /// The minimum fraction of position evidence for a base call.
    min_purity: f64,

    /// Whether base calls may use ambiguity codes.
    ambiguity_codes: bool,
}

impl Caller {
    /// Creates a new [`Caller`].
    pub fn new(min_depth: u32, min_purity: f64, ambiguity_codes: bool) -> Self {
        Self {
            min_depth,
            min_purity,
            ambiguity_codes,
        }
    }

    /// Calls the insertion before position `i`.
    ///
    /// Returns the candidates (including the synthetic no-insertion count)
    /// and the called run, if any.
    fn call_insertion(&self, pileup: &Pileup, i: usize) -> (Tally<Vec<u8>>, Option<Vec<u8>>) {
        let mut candidates = pileup.insertions(i).clone();
        let total = candidates.total();

        let depth = pileup.depth();
        let mut spanning = depth[i];
        if i > 0 {
            spanning = spanning.min(depth[i - 1]);
        }

        if spanning > total {
            candidates.add(NO_INSERTION, spanning - total);
        }

        let called = call_inserted_run(&candidates, self.min_depth);
        (candidates, called)
    }

    /// Calls the base at position `i`.
    fn call_base(&self, pileup: &Pileup, i: usize) -> Option<u8> {
        let bases = pileup.bases(i);

        match self.ambiguity_codes {
            true => call_ambiguous(bases, self.min_depth, self.min_purity),
            false => call_strict(bases, self.min_depth, self.min_purity).copied(),
        }
    }

    /// Calls the consensus of a reference from its pileup.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::consensus::Caller;
    /// use refcons::consensus::Kind;
    /// use refcons::hit::Hit;
    /// use refcons::pileup::Pileup;
    /// use refcons::record::HitRecord;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGTACGT")?;
    /// let reference = references.get("seq0").unwrap();
    ///
    /// let mut pileup = Pileup::new(reference);
    /// for _ in 0..3 {
    ///     let record = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t4T3".parse::<HitRecord>()?;
    ///     pileup.add_unambiguous(&Hit::try_from_record(record, reference)?, 0);
    /// }
    ///
    /// let consensus = Caller::default().call(reference, &pileup);
    /// assert_eq!(consensus.sequence(), b"ACGTTCGT");
    /// assert_eq!(consensus.changes().len(), 1);
    /// assert_eq!(consensus.changes()[0].kind(), Kind::Substitution);
    /// assert_eq!(consensus.changes()[0].position(), 4);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn call(&self, reference: &Reference, pileup: &Pileup) -> Consensus {
        let len = reference.len().min(pileup.len());

        let mut sequence = Vec::with_capacity(len);
        let mut masked = Vec::with_capacity(len);
        let mut changes = Vec::new();
        let mut has_consensus = Vec::with_capacity(len);
        let mut reference_track = Vec::with_capacity(len);
        let mut consensus_track = Vec::with_capacity(len);
        let mut insertion_evidence = Vec::with_capacity(len);
        let mut substitution_evidence = Vec::with_capacity(len);
        let mut no_calls = 0;

        for i in 0..len {
            if i % PROGRESS_INTERVAL == 0 && i > 0 {
                debug!("called consensus for {i} of {len} positions of {}", reference.name());
            }

            let (candidates, insertion) = self.call_insertion(pileup, i);
            let candidates = Evidence::from(&candidates);

            if let Some(run) = insertion {
                let new = String::from_utf8_lossy(&run).into_owned();
                changes.push(Change::new(
                    reference.name(),
                    i,
                    Kind::InsertionBefore,
                    "-",
                    new,
                    candidates.clone(),
                ));

                sequence.extend_from_slice(&run);
                masked.extend_from_slice(&run);
                reference_track.extend(std::iter::repeat(GAP).take(run.len()));
                consensus_track.extend_from_slice(&run);
            }

            insertion_evidence.push(candidates);

            let reference_base = reference.sequence()[i];
            let bases = Evidence::from(pileup.bases(i));

            match self.call_base(pileup, i) {
                None => {
                    no_calls += 1;
                    sequence.push(NO_CALL);
                    masked.push(reference_base.to_ascii_lowercase());
                    has_consensus.push(false);
                    consensus_track.push(NO_CALL);
                }
                Some(GAP) => {
                    changes.push(Change::new(
                        reference.name(),
                        i,
                        Kind::Deletion,
                        char::from(reference_base).to_string(),
                        "-",
                        bases.clone(),
                    ));
                    has_consensus.push(true);
                    consensus_track.push(GAP);
                }
                Some(base) => {
                    sequence.push(base);
                    masked.push(base);
                    has_consensus.push(matches!(base, b'A' | b'C' | b'G' | b'T'));
                    consensus_track.push(base);

                    if !ambiguity::represents(base, reference_base) {
                        changes.push(Change::new(
                            reference.name(),
                            i,
                            Kind::Substitution,
                            char::from(reference_base).to_string(),
                            char::from(base).to_string(),
                            bases.clone(),
                        ));
                    }
                }
            }

            reference_track.push(reference_base);
            substitution_evidence.push(bases);
        }

        // SAFETY: both tracks receive one byte per reference position and one
        // byte per inserted base, so their lengths always match.
        let alignment = Alignment::try_new(reference_track, consensus_track).unwrap();

        Consensus {
            name: reference.name().to_string(),
            sequence,
            masked,
            changes,
            has_consensus,
            alignment,
            insertion_evidence,
            substitution_evidence,
            no_calls,
        }
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Caller {
    fn from(config: &Config) -> Self {
        Self::new(
            config.min_depth(),
            config.min_purity(),
            config.ambiguity_codes(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::tests::hit;
    use crate::reference::ReferenceSet;

    /// Builds a pileup by folding in each hit line as an unambiguous hit.
    fn pileup(references: &ReferenceSet, lines: &[&str]) -> Pileup {
        let mut pileup = Pileup::new(references.get("seq0").unwrap());
        for line in lines {
            let hit = hit(references, line);
            pileup.add_unambiguous(&hit, 0);
            pileup.add_ambiguous(&hit, 1);
        }
        pileup
    }

    /// Creates a tally of bases.
    fn tally(counts: &[(u8, u32)]) -> Tally<u8> {
        let mut tally = Tally::default();
        for (base, count) in counts {
            tally.add(base, *count);
        }
        tally
    }

    #[test]
    fn test_clear_majority_is_called_in_both_modes() {
        let counts = tally(&[(b'A', 6), (b'T', 4)]);
        assert_eq!(call_strict(&counts, 5, 0.5), Some(&b'A'));
        assert_eq!(call_ambiguous(&counts, 5, 0.5), Some(b'A'));
    }

    #[test]
    fn test_tie_is_split_only_by_strict_calls() {
        let counts = tally(&[(b'T', 5), (b'A', 5)]);
        assert_eq!(call_strict(&counts, 5, 0.5), Some(&b'A'));
        assert_eq!(call_ambiguous(&counts, 5, 0.5), Some(b'W'));
    }

    #[test]
    fn test_ambiguous_call_without_a_code() {
        let counts = tally(&[(b'A', 3), (b'-', 3)]);
        assert_eq!(call_ambiguous(&counts, 2, 0.9), None);

        let counts = tally(&[(b'A', 1), (b'C', 1), (b'G', 1), (b'T', 1)]);
        assert_eq!(call_ambiguous(&counts, 2, 0.9), None);
    }

    #[test]
    fn test_three_way_code() {
        let counts = tally(&[(b'C', 3), (b'G', 3), (b'T', 2), (b'A', 1)]);
        assert_eq!(call_ambiguous(&counts, 2, 0.8), Some(b'B'));
    }

    #[test]
    fn test_perfect_reads_reproduce_the_reference() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let line = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t8";
        let pileup = pileup(&references, &[line, line, line, line]);

        let consensus = Caller::default().call(references.get("seq0").unwrap(), &pileup);
        assert_eq!(consensus.sequence(), b"ACGTACGT");
        assert_eq!(consensus.masked(), b"ACGTACGT");
        assert!(consensus.changes().is_empty());
        assert!(consensus.has_consensus().iter().all(|has| *has));
        assert_eq!(consensus.alignment().reference(), b"ACGTACGT");
        assert_eq!(consensus.alignment().read(), b"ACGTACGT");
        assert_eq!(consensus.insertion_evidence()[3].to_string(), "\"-\"x4");
        assert_eq!(consensus.substitution_evidence()[3].to_string(), "\"T\"x4");

        Ok(())
    }

    #[test]
    fn test_insertion_and_deletion() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        // Two reads insert `GG` before position 4 and delete position 6.
        let line = "r\tseq0\t+\t1\t8\t1\t9\t9\t80\t4(gg)2-1";
        let pileup = pileup(&references, &[line, line]);

        let consensus = Caller::default().call(references.get("seq0").unwrap(), &pileup);
        assert_eq!(consensus.sequence(), b"ACGTGGACT");
        assert_eq!(consensus.alignment().reference(), b"ACGT--ACGT");
        assert_eq!(consensus.alignment().read(), b"ACGTGGAC-T");
        assert!(consensus.has_consensus().iter().all(|has| *has));

        let changes = consensus.changes();
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].kind(), Kind::InsertionBefore);
        assert_eq!(changes[0].position(), 4);
        assert_eq!(changes[0].old(), "-");
        assert_eq!(changes[0].new_value(), "GG");
        assert_eq!(changes[0].evidence().to_string(), "\"GG\"x2");

        assert_eq!(changes[1].kind(), Kind::Deletion);
        assert_eq!(changes[1].position(), 6);
        assert_eq!(changes[1].old(), "G");
        assert_eq!(changes[1].new_value(), "-");

        Ok(())
    }

    #[test]
    fn test_insertions_ignore_purity() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let inserted = "r\tseq0\t+\t1\t8\t1\t9\t9\t80\t4(c)4";
        let plain = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t8";
        let pileup = pileup(&references, &[inserted, inserted, inserted, plain, plain]);

        // `C` wins three to two; purity is never consulted for insertions.
        let caller = Caller::new(2, 0.9, true);
        let consensus = caller.call(references.get("seq0").unwrap(), &pileup);
        assert_eq!(consensus.changes()[0].kind(), Kind::InsertionBefore);
        assert_eq!(consensus.changes()[0].new_value(), "C");
        assert_eq!(
            consensus.insertion_evidence()[4].to_string(),
            "\"C\"x3 \"-\"x2"
        );

        Ok(())
    }

    #[test]
    fn test_ambiguity_code_is_not_a_definite_call() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let reference_like = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t8";
        let variant = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t1T6";
        let pileup = pileup(
            &references,
            &[reference_like, reference_like, variant, variant],
        );

        let reference = references.get("seq0").unwrap();
        let consensus = Caller::default().call(reference, &pileup);
        assert_eq!(consensus.sequence(), b"AYGTACGT");
        assert!(!consensus.has_consensus()[1]);
        assert!(consensus.changes().is_empty());
        assert_eq!(consensus.reference_having_consensus(reference), b"AnGTACGT");

        assert_eq!(consensus.no_calls(), 0);

        let strict = Caller::new(2, 0.5, false).call(reference, &pileup);
        assert_eq!(strict.sequence(), b"ACGTACGT");

        Ok(())
    }

    #[test]
    fn test_positions_below_depth_are_counted() -> Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let short = "r\tseq0\t+\t1\t7\t1\t7\t7\t70\t7";
        let full = "r\tseq0\t+\t1\t8\t1\t8\t8\t80\t8";
        let pileup = pileup(&references, &[short, short, full]);

        let reference = references.get("seq0").unwrap();
        let consensus = Caller::new(2, 0.5, true).call(reference, &pileup);
        assert_eq!(consensus.sequence(), b"ACGTACGN");
        assert_eq!(consensus.masked(), b"ACGTACGt");
        assert_eq!(consensus.no_calls(), 1);

        Ok(())
    }

    #[test]
    fn test_no_insertion_wins_ties_regardless_of_symbol() {
        let mut candidates = Tally::<Vec<u8>>::default();
        candidates.add(b"*".as_slice(), 3);
        candidates.add(NO_INSERTION, 3);
        assert_eq!(call_inserted_run(&candidates, 2), None);

        candidates.add(b"*".as_slice(), 1);
        assert_eq!(call_inserted_run(&candidates, 2), Some(b"*".to_vec()));
        assert_eq!(call_inserted_run(&candidates, 5), None);

        let mut candidates = Tally::<Vec<u8>>::default();
        candidates.add(NO_INSERTION, 4);
        assert_eq!(call_inserted_run(&candidates, 2), None);
    }
}
