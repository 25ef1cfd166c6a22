//! Writers for the outputs of a run.
//!
//! Every writer renders onto any [`std::io::Write`]; choosing file names and
//! opening files is left to the caller.

use std::io;
use std::io::Write;

use crate::alignment::Alignment;
use crate::alignment::GAP;
use crate::consensus::Change;
use crate::consensus::Consensus;
use crate::pileup::Pileup;
use crate::reference::Reference;
use crate::resolve::pair::Stats;
use crate::resolve::pair::WeirdPair;

/// The number of bases per FASTA line.
pub const FASTA_LINE_WIDTH: usize = 60;

/// The source column of feature rows.
pub const GFF_SOURCE: &str = "refcons";

/// The type column of feature rows.
pub const GFF_TYPE: &str = "variation";

/// The header row of the change report.
pub const REPORT_HEADER: &str = "Sequence\tPosition in reference\tChange type\tOld\tNew\tEvidence";

/// The header row of the evidence dump.
pub const EVIDENCE_HEADER: &str =
    "Position\tInsertion-before evidence\tSubstitution evidence\tReference";

/// The header row of the weird pair listing.
pub const WEIRD_PAIRS_HEADER: &str = "Left sequence\tLeft strand\tLeft position\tRight \
                                      sequence\tRight strand\tRight position";

/// The characters replaced by [`filesystem_friendly_name()`].
const UNFRIENDLY_CHARACTERS: &[char] = &['\'', '"', '<', '>', '&', '|', '/', '\\', '_', ' ', '.'];

/// Writes one FASTA record, wrapping the sequence every
/// [`FASTA_LINE_WIDTH`] bases.
///
/// # Examples
///
/// ```
/// use refcons::write;
///
/// let mut buffer = Vec::new();
/// write::fasta(&mut buffer, "seq0", &[b'A'; 70])?;
///
/// let expected = format!(">seq0\n{}\n{}\n", "A".repeat(60), "A".repeat(10));
/// assert_eq!(String::from_utf8(buffer)?, expected);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn fasta<W: Write>(writer: &mut W, name: &str, sequence: &[u8]) -> io::Result<()> {
    writeln!(writer, ">{name}")?;

    for line in sequence.chunks(FASTA_LINE_WIDTH) {
        writer.write_all(line)?;
        writeln!(writer)?;
    }

    Ok(())
}

/// Writes the change report header.
pub fn report_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{REPORT_HEADER}")
}

/// Writes one report row per change.
pub fn report_rows<W: Write>(writer: &mut W, changes: &[Change]) -> io::Result<()> {
    for change in changes {
        writeln!(writer, "{change}")?;
    }

    Ok(())
}

/// Writes one nine-column feature row per change.
///
/// # Examples
///
/// ```
/// use refcons::consensus::change::Change;
/// use refcons::consensus::change::Evidence;
/// use refcons::consensus::change::Kind;
/// use refcons::write;
///
/// let changes = [Change::new("seq0", 4, Kind::InsertionBefore, "-", "GG", Evidence::default())];
///
/// let mut buffer = Vec::new();
/// write::gff_rows(&mut buffer, &changes)?;
///
/// assert_eq!(
///     String::from_utf8(buffer)?,
///     "seq0\trefcons\tvariation\t4\t5\t.\t+\t.\tproduct=Insertion: .GG. ()\n"
/// );
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn gff_rows<W: Write>(writer: &mut W, changes: &[Change]) -> io::Result<()> {
    for change in changes {
        let (start, end) = change.feature_interval();

        writeln!(
            writer,
            "{}\t{GFF_SOURCE}\t{GFF_TYPE}\t{start}\t{end}\t.\t+\t.\tproduct={}",
            change.reference_id(),
            change.product()
        )?;
    }

    Ok(())
}

/// Writes the per-position evidence dump of a consensus.
///
/// Positions are 1-based. Every position gets a row, including those
/// without any evidence.
pub fn evidence<W: Write>(
    writer: &mut W,
    consensus: &Consensus,
    reference: &Reference,
) -> io::Result<()> {
    writeln!(writer, "{EVIDENCE_HEADER}")?;

    let rows = consensus
        .insertion_evidence()
        .iter()
        .zip(consensus.substitution_evidence())
        .zip(reference.sequence());

    for (i, ((insertions, bases), base)) in rows.enumerate() {
        writeln!(
            writer,
            "{}\t{insertions}\t{bases}\t{}",
            i + 1,
            char::from(*base)
        )?;
    }

    Ok(())
}

/// Writes the unambiguous depth of a pileup, one value per line.
pub fn depth<W: Write>(writer: &mut W, pileup: &Pileup) -> io::Result<()> {
    for depth in pileup.depth() {
        writeln!(writer, "{depth}")?;
    }

    Ok(())
}

/// Writes the ambiguous depth of a pileup, one value per line with one
/// decimal.
///
/// # Examples
///
/// ```
/// use refcons::pileup::Pileup;
/// use refcons::reference::ReferenceSet;
/// use refcons::write;
///
/// let mut references = ReferenceSet::default();
/// references.add("seq0", b"AC")?;
///
/// let mut buffer = Vec::new();
/// write::ambiguous_depth(&mut buffer, &Pileup::new(references.get("seq0").unwrap()))?;
/// assert_eq!(String::from_utf8(buffer)?, "0.0\n0.0\n");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn ambiguous_depth<W: Write>(writer: &mut W, pileup: &Pileup) -> io::Result<()> {
    for depth in pileup.ambiguous_depth() {
        writeln!(writer, "{depth:.1}")?;
    }

    Ok(())
}

/// Writes the header of a multiple alignment file.
pub fn maf_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "##maf version=1")?;
    writeln!(writer, "# {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Writes one alignment block of the reference track against the consensus
/// track.
///
/// # Examples
///
/// ```
/// use refcons::alignment::Alignment;
/// use refcons::write;
///
/// let alignment = Alignment::try_new(b"AC-GT".to_vec(), b"ACT-T".to_vec())?;
///
/// let mut buffer = Vec::new();
/// write::maf_block(&mut buffer, "seq0", &alignment)?;
///
/// assert_eq!(
///     String::from_utf8(buffer)?,
///     "\na\ns seq0 0 4 + 4 AC-GT\ns seq0-consensus 0 4 + 4 ACT-T\n"
/// );
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn maf_block<W: Write>(writer: &mut W, name: &str, alignment: &Alignment) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "a")?;
    maf_line(writer, name, alignment.reference())?;
    maf_line(writer, &format!("{name}-consensus"), alignment.read())
}

/// Writes one `s` line of an alignment block.
fn maf_line<W: Write>(writer: &mut W, name: &str, track: &[u8]) -> io::Result<()> {
    let len = track.iter().filter(|base| **base != GAP).count();

    write!(writer, "s {name} 0 {len} + {len} ")?;
    writer.write_all(track)?;
    writeln!(writer)
}

/// Writes the pair statistics.
///
/// # Examples
///
/// ```
/// use refcons::resolve::pair::Stats;
/// use refcons::write;
///
/// let mut buffer = Vec::new();
/// write::pair_stats(&mut buffer, &Stats::default())?;
///
/// let text = String::from_utf8(buffer)?;
/// assert!(text.contains("Median separation (limit 0): none\n"));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn pair_stats<W: Write>(writer: &mut W, stats: &Stats) -> io::Result<()> {
    writeln!(writer, "Pairs where both reads hit something: {}", stats.both_hit())?;
    writeln!(
        writer,
        "Pairs validly oriented and spaced: {}",
        stats.valid()
    )?;
    writeln!(writer, "Unambiguous pairs: {}", stats.unambiguous())?;

    match stats.median_separation() {
        Some(median) => writeln!(
            writer,
            "Median separation (limit {}): {median}",
            stats.max_pair_sep()
        )?,
        None => writeln!(
            writer,
            "Median separation (limit {}): none",
            stats.max_pair_sep()
        )?,
    }

    writeln!(writer, "Orphaned reads: {}", stats.orphans())?;
    writeln!(writer, "Unpaired reads: {}", stats.unpaired())
}

/// Writes the weird pairs.
pub fn weird_pairs<W: Write>(writer: &mut W, pairs: &[WeirdPair]) -> io::Result<()> {
    writeln!(writer, "{WEIRD_PAIRS_HEADER}")?;

    for pair in pairs {
        let (left, right) = (pair.left(), pair.right());

        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            left.reference_id(),
            left.strand(),
            left.position(),
            right.reference_id(),
            right.strand(),
            right.position()
        )?;
    }

    Ok(())
}

/// Replaces characters that are awkward in file names with `_`.
///
/// # Examples
///
/// ```
/// use refcons::write::filesystem_friendly_name;
///
/// assert_eq!(filesystem_friendly_name("chr1 v2.1|x/y"), "chr1_v2_1_x_y");
/// ```
pub fn filesystem_friendly_name(name: &str) -> String {
    name.replace(UNFRIENDLY_CHARACTERS, "_")
}
