//! End-to-end processing of one batch of hits.
//!
//! A run is made up of four phases:
//!
//! 1. The hit stream is scanned once to build an [`Index`].
//! 2. Every read (or mate pair) is materialized from the index and resolved
//!    into the [`Pileups`].
//! 3. A [`Consensus`] is called for every reference from its [`Pileup`].
//! 4. The results are handed back as an [`Output`].
//!
//! A run either completes over the full hit stream or fails; partial pileups
//! are never returned.

use std::io::BufRead;
use std::io::Seek;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::consensus::Caller;
use crate::consensus::Consensus;
use crate::index;
use crate::index::Index;
use crate::index::Materializer;
use crate::index::materializer;
use crate::pileup::Pileup;
use crate::pileup::Pileups;
use crate::reader::Reader;
use crate::reference::ReferenceSet;
use crate::resolve::pair;
use crate::resolve::single;

/// Read ids that look like they belong to mate pairs.
static PAIRED_LOOKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(_F3|_R3|/1|/2)$").unwrap());

/// An error related to running the [`Engine`].
#[derive(Debug)]
pub enum Error {
    /// The hit stream could not be indexed.
    Index(index::builder::Error),

    /// Hits could not be materialized from the hit stream.
    Materialize(materializer::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Index(err) => write!(f, "index error: {err}"),
            Error::Materialize(err) => write!(f, "materialize error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// How the reads of a run were resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Reads were resolved on their own.
    Single(single::Summary),

    /// Reads were resolved as mate pairs where possible.
    Paired(pair::Report),
}

/// The results of a run.
#[derive(Debug)]
pub struct Output {
    /// The accumulated evidence for every reference.
    pileups: Pileups,

    /// The called consensus for every reference, in reference order.
    consensuses: Vec<Consensus>,

    /// How the reads were resolved.
    resolution: Resolution,
}

impl Output {
    /// Gets the accumulated evidence for every reference.
    pub fn pileups(&self) -> &Pileups {
        &self.pileups
    }

    /// Gets the pileup of a reference by name.
    pub fn pileup(&self, name: &str) -> Option<&Pileup> {
        self.pileups.get(name)
    }

    /// Gets the called consensus for every reference, in reference order.
    pub fn consensuses(&self) -> &[Consensus] {
        &self.consensuses
    }

    /// Gets how the reads were resolved.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Gets the pair report, if reads were resolved as mate pairs.
    pub fn pair_report(&self) -> Option<&pair::Report> {
        match &self.resolution {
            Resolution::Paired(report) => Some(report),
            Resolution::Single(_) => None,
        }
    }
}

/// Calls consensus sequences for a set of references from a hit stream.
#[derive(Debug)]
pub struct Engine<'a> {
    /// The run configuration.
    config: &'a Config,

    /// The references the hits are aligned against.
    references: &'a ReferenceSet,
}

impl<'a> Engine<'a> {
    /// Creates a new [`Engine`].
    pub fn new(config: &'a Config, references: &'a ReferenceSet) -> Self {
        Self { config, references }
    }

    /// Runs the engine over a hit stream.
    ///
    /// The stream is read once from start to end to build the index and then
    /// accessed by offset, so it must support seeking.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    ///
    /// use refcons::config::Config;
    /// use refcons::engine::Engine;
    /// use refcons::reference::ReferenceSet;
    ///
    /// let mut references = ReferenceSet::default();
    /// references.add("seq0", b"ACGTACGT")?;
    ///
    /// let data = b"r0\tseq0\t+\t1\t8\t1\t8\t8\t80\t4T3\n\
    ///              r1\tseq0\t+\t1\t8\t1\t8\t8\t80\t4T3\n";
    ///
    /// let config = Config::default();
    /// let output = Engine::new(&config, &references).run(Cursor::new(&data[..]))?;
    ///
    /// let consensus = &output.consensuses()[0];
    /// assert_eq!(consensus.sequence(), b"ACGTTCGT");
    /// assert_eq!(consensus.changes().len(), 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn run<T>(&self, mut hits: T) -> Result<Output>
    where
        T: BufRead + Seek,
    {
        let index = index::Builder
            .try_build_from(Reader::new(&mut hits))
            .map_err(Error::Index)?;
        info!("indexed hits for {} reads", index.len());

        let mut pileups = Pileups::new(self.references);
        let mut materializer = Materializer::new(hits, &index, self.references);

        let resolution = match pair::Resolver::from_config(self.config) {
            Some(resolver) => {
                let report = resolver
                    .run(&mut materializer, &mut pileups)
                    .map_err(Error::Materialize)?;
                info!(
                    "resolved {} pairs with both mates hit ({} valid, {} unambiguous)",
                    report.stats.both_hit(),
                    report.stats.valid(),
                    report.stats.unambiguous()
                );
                Resolution::Paired(report)
            }
            None => {
                warn_if_paired_looking(&index);

                let summary = single::Resolver::from(self.config)
                    .run(&mut materializer, index.read_ids(), &mut pileups)
                    .map_err(Error::Materialize)?;
                info!(
                    "resolved {} reads ({} unambiguous, {} ambiguous)",
                    summary.reads, summary.unambiguous, summary.ambiguous
                );
                Resolution::Single(summary)
            }
        };

        let caller = Caller::from(self.config);
        let consensuses = self
            .references
            .iter()
            .filter_map(|reference| {
                pileups
                    .get(reference.name())
                    .map(|pileup| caller.call(reference, pileup))
            })
            .collect::<Vec<_>>();

        let changes = consensuses
            .iter()
            .map(|consensus| consensus.changes().len())
            .sum::<usize>();
        let no_calls = consensuses
            .iter()
            .map(|consensus| consensus.no_calls())
            .sum::<usize>();
        info!(
            "called {} consensus sequences ({changes} changes, {no_calls} positions without a \
             call)",
            consensuses.len()
        );

        Ok(Output {
            pileups,
            consensuses,
            resolution,
        })
    }
}

/// Warns once if any read id looks like it belongs to a mate pair.
fn warn_if_paired_looking(index: &Index) {
    if let Some(read_id) = index.read_ids().find(|id| PAIRED_LOOKING.is_match(id)) {
        warn!(
            "read ids such as `{read_id}` look paired, but pairing is disabled; all reads \
             will be treated as single reads"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;
    use std::io::Cursor;
    use std::io::Write as _;

    use tempdir::TempDir;

    use super::*;
    use crate::config;
    use crate::config::Pairing;

    #[test]
    fn test_perfect_reads_reproduce_the_reference()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;

        let data = (0..4)
            .map(|i| format!("read{i}\tseq0\t+\t1\t8\t1\t8\t8\t80\t8\n"))
            .collect::<String>();

        let config = Config::default();
        let output = Engine::new(&config, &references).run(Cursor::new(data.as_bytes()))?;

        let consensus = &output.consensuses()[0];
        assert_eq!(consensus.sequence(), b"ACGTACGT");
        assert!(consensus.changes().is_empty());
        assert!(consensus.has_consensus().iter().all(|has| *has));
        assert_eq!(consensus.no_calls(), 0);
        assert_eq!(output.pileup("seq0").unwrap().depth(), &[4; 8]);
        assert_eq!(
            output.resolution(),
            &Resolution::Single(single::Summary {
                reads: 4,
                unambiguous: 4,
                ambiguous: 0,
            })
        );

        Ok(())
    }

    #[test]
    fn test_reverse_and_forward_reads_agree()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"AACCGGTT")?;

        // `CCGG` is its own reverse complement, so the reverse hit reads
        // `CCGG` with its third base (in its own orientation) changed to `A`,
        // which is the reference `C` at position 3 changed to `T`.
        let data = b"f\tseq0\t+\t3\t6\t1\t4\t4\t40\t1T2\n\
                     r\tseq0\t-\t3\t6\t1\t4\t4\t40\t2A1\n";

        let config = Config::default();
        let output = Engine::new(&config, &references).run(Cursor::new(&data[..]))?;

        let consensus = &output.consensuses()[0];
        assert_eq!(consensus.sequence(), b"NNCTGGNN");
        assert_eq!(consensus.masked(), b"aaCTGGtt");
        assert_eq!(consensus.changes().len(), 1);
        assert_eq!(consensus.changes()[0].to_string(), "seq0\t4\tsubstitution\tC\tT\t\"T\"x2");

        Ok(())
    }

    #[test]
    fn test_file_backed_hit_stream() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGTACGT")?;
        references.add("seq1", b"TTTTGGGG")?;

        let directory = TempDir::new("refcons")?;
        let path = directory.path().join("hits.txt");

        {
            let mut file = File::create(&path)?;
            writeln!(file, "# produced by an aligner")?;
            for i in 0..3 {
                writeln!(file, "a{i}\tseq0\t+\t1\t8\t1\t7\t7\t70\t2-5")?;
                writeln!(file, "b{i}\tseq1\t+\t3\t6\t1\t4\t4\t40\t4")?;
            }
        }

        let config = Config::default();
        let output = Engine::new(&config, &references).run(BufReader::new(File::open(&path)?))?;

        let first = &output.consensuses()[0];
        assert_eq!(first.sequence(), b"ACTACGT");
        assert_eq!(first.changes().len(), 1);
        assert_eq!(first.changes()[0].to_string(), "seq0\t3\tdeletion\tG\t-\t\"-\"x3");

        let second = &output.consensuses()[1];
        assert_eq!(second.sequence(), b"NNTTGGNN");
        assert_eq!(second.reference_having_consensus(references.get("seq1").unwrap()), b"nnTTGGnn");

        Ok(())
    }

    #[test]
    fn test_unknown_reference_is_fatal()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", b"ACGT")?;

        let data = b"r\tseq9\t+\t1\t4\t1\t4\t4\t40\t4\n";

        let config = Config::default();
        let err = Engine::new(&config, &references)
            .run(Cursor::new(&data[..]))
            .unwrap_err();
        assert_eq!(err.to_string(), "materialize error: unknown reference: seq9");

        Ok(())
    }

    #[test]
    fn test_pairs_within_and_beyond_the_separation_limit()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut references = ReferenceSet::default();
        references.add("seq0", &[b'A'; 2000])?;

        let data = b"near/1\tseq0\t+\t101\t150\t1\t50\t50\t50\t50\n\
                     near/2\tseq0\t-\t351\t400\t1\t50\t50\t50\t50\n\
                     far/1\tseq0\t+\t1001\t1050\t1\t50\t50\t90\t50\n\
                     far/2\tseq0\t-\t1551\t1600\t1\t50\t50\t90\t50\n";

        let config = config::Builder::default()
            .pairing(Pairing::illumina(500))
            .try_build()?;
        let output = Engine::new(&config, &references).run(Cursor::new(&data[..]))?;

        let report = output.pair_report().unwrap();
        assert_eq!(report.stats.both_hit(), 2);
        assert_eq!(report.stats.valid(), 1);
        assert_eq!(report.stats.unambiguous(), 1);
        assert_eq!(report.stats.median_separation(), Some(300));
        assert!(report.weird_pairs.is_empty());

        let pileup = output.pileup("seq0").unwrap();
        assert_eq!(pileup.depth()[100], 1);
        assert_eq!(pileup.depth()[399], 1);
        assert_eq!(pileup.depth()[1000], 0);
        assert_eq!(pileup.depth()[1599], 0);

        Ok(())
    }
}
